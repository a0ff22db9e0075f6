//! Subscription bookkeeping.
//!
//! The registry remembers two things per topic:
//!
//! - the local listeners interested in it (kept across reconnects)
//! - the protocol-level subscription currently open for it on the live
//!   connection, if any (forgotten on every disconnect)
//!
//! It never does I/O. Callers ask it what to send (`open`, `remove`,
//! `replay`) and send the frames themselves.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use gambit_protocol::{SubscriptionId, Topic};
use serde_json::Value;

/// A topic listener. Receives each decoded message body.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// Result of [`SubscriptionRegistry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The listener was not registered (already removed).
    NotFound,
    /// Other listeners remain on the topic.
    Remaining,
    /// That was the last listener. Carries the live subscription to tear
    /// down, if one was open.
    Emptied(Option<SubscriptionId>),
}

#[derive(Default)]
struct TopicEntry {
    listeners: Vec<(ListenerId, Listener)>,
    live: Option<SubscriptionId>,
}

/// Topic → listeners, plus which topics are live on the current link.
///
/// Invariant: a topic has an entry iff it has at least one listener, and
/// at most one live subscription.
#[derive(Default)]
pub struct SubscriptionRegistry {
    // BTreeMap so replay order is deterministic.
    topics: BTreeMap<Topic, TopicEntry>,
    by_subscription: HashMap<SubscriptionId, Topic>,
    next_listener: u64,
    next_subscription: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` on `topic`. The flag is `true` when it is the
    /// topic's first listener.
    pub fn add(&mut self, topic: Topic, listener: Listener) -> (ListenerId, bool) {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;

        let entry = self.topics.entry(topic).or_default();
        let first = entry.listeners.is_empty();
        entry.listeners.push((id, listener));
        (id, first)
    }

    /// Marks `topic` live under a fresh subscription id, if it has
    /// listeners and is not live yet. Returns the id to SUBSCRIBE with.
    pub fn open(&mut self, topic: &Topic) -> Option<SubscriptionId> {
        let entry = self.topics.get_mut(topic)?;
        if entry.live.is_some() || entry.listeners.is_empty() {
            return None;
        }
        let sub = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        entry.live = Some(sub);
        self.by_subscription.insert(sub, topic.clone());
        Some(sub)
    }

    /// Removes one listener. Idempotent.
    pub fn remove(&mut self, topic: &Topic, id: ListenerId) -> Removal {
        let Some(entry) = self.topics.get_mut(topic) else {
            return Removal::NotFound;
        };
        let before = entry.listeners.len();
        entry.listeners.retain(|(lid, _)| *lid != id);
        if entry.listeners.len() == before {
            return Removal::NotFound;
        }
        if !entry.listeners.is_empty() {
            return Removal::Remaining;
        }

        let live = entry.live;
        self.topics.remove(topic);
        if let Some(sub) = live {
            self.by_subscription.remove(&sub);
        }
        Removal::Emptied(live)
    }

    /// Opens every topic that has listeners but no live subscription.
    /// Returns the SUBSCRIBE frames to send, in topic order.
    pub fn replay(&mut self) -> Vec<(SubscriptionId, Topic)> {
        let pending: Vec<Topic> = self
            .topics
            .iter()
            .filter(|(_, e)| e.live.is_none() && !e.listeners.is_empty())
            .map(|(t, _)| t.clone())
            .collect();

        pending
            .into_iter()
            .filter_map(|topic| self.open(&topic).map(|sub| (sub, topic)))
            .collect()
    }

    /// The link went down: no subscription is live any more. Listeners
    /// stay.
    pub fn clear_live(&mut self) {
        for entry in self.topics.values_mut() {
            entry.live = None;
        }
        self.by_subscription.clear();
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.topics.clear();
        self.by_subscription.clear();
    }

    /// Snapshot of the listeners behind a live subscription.
    pub fn listeners_for(&self, sub: SubscriptionId) -> Option<(Topic, Vec<Listener>)> {
        let topic = self.by_subscription.get(&sub)?;
        let entry = self.topics.get(topic)?;
        let listeners = entry.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
        Some((topic.clone(), listeners))
    }

    /// 1 if `topic` is live on the current link, else 0.
    pub fn live_count(&self, topic: &Topic) -> usize {
        self.topics
            .get(topic)
            .map_or(0, |e| usize::from(e.live.is_some()))
    }

    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map_or(0, |e| e.listeners.len())
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
