//! Topic multiplexing over the one shared connection.
//!
//! Every feature of the client (the game board, chat, matchmaking) listens
//! on its own topic, but they all share a single STOMP link. The
//! [`Multiplexer`] keeps the listener registrations, opens exactly one
//! protocol subscription per topic that has listeners, and fans each
//! inbound MESSAGE out to the listeners of its topic.
//!
//! # Locking
//!
//! All mutable state sits behind one `std::sync::Mutex`. It is held only
//! for bookkeeping and for queueing frames on the unbounded outbound
//! channel, never across an `.await` and never while listener code runs:
//! dispatch snapshots the listener set first and invokes it after the lock
//! is released. A listener may therefore subscribe or unsubscribe (itself
//! included) while it is being called.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use gambit_game::Publisher;
use gambit_protocol::{Codec, Command, Frame, JsonCodec, Topic};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch, Notify};

use crate::registry::{Listener, ListenerId, Removal, SubscriptionRegistry};
use crate::ConnectError;

/// Capacity of the connectivity event channel. Slow receivers lag rather
/// than block the connection.
const EVENT_CAPACITY: usize = 64;

/// Where the shared link currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Connectivity notifications, for status indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake done and every registered topic re-subscribed.
    Connected,
    /// The link went down or `disconnect()` was called.
    Disconnected,
    /// A frame could not be handled. Dispatch carried on.
    ProtocolError(String),
}

pub(crate) type Completion = Option<Result<(), ConnectError>>;

/// Shared state behind the hub lock.
pub(crate) struct HubState {
    pub(crate) connection: ConnectionState,
    pub(crate) registry: SubscriptionRegistry,
    /// Frames for the live link. `None` unless connected.
    pub(crate) outbound: Option<mpsc::UnboundedSender<Frame>>,
    /// Completion signal of the in-flight connect, shared by every caller.
    pub(crate) pending: Option<watch::Sender<Completion>>,
    /// Bumped by every `disconnect()`. Work started under an older value
    /// is stale and must not touch this state.
    pub(crate) generation: u64,
    /// Wakes the background worker out of its reconnect delay. `None`
    /// when no worker is running.
    pub(crate) wake: Option<Arc<Notify>>,
}

impl HubState {
    fn send(&self, frame: Frame) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }
}

pub(crate) struct Hub {
    state: Mutex<HubState>,
    events: broadcast::Sender<ConnectionEvent>,
    codec: JsonCodec,
}

impl Hub {
    fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(HubState {
                connection: ConnectionState::Disconnected,
                registry: SubscriptionRegistry::new(),
                outbound: None,
                pending: None,
                generation: 0,
                wake: None,
            }),
            events,
            codec: JsonCodec,
        }
    }

    /// Locks the shared state. A listener that panicked on another thread
    /// does not poison the bookkeeping for everyone else.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn protocol_error(&self, message: String) {
        tracing::warn!(error = %message, "protocol error");
        self.emit(ConnectionEvent::ProtocolError(message));
    }

    fn unsubscribe(&self, topic: &Topic, id: ListenerId) {
        let mut state = self.lock();
        match state.registry.remove(topic, id) {
            Removal::Emptied(Some(sub)) => {
                if state.connection == ConnectionState::Connected {
                    state.send(Frame::unsubscribe(sub));
                }
                tracing::debug!(%topic, %sub, "last listener left, unsubscribed");
            }
            Removal::Emptied(None) => {
                tracing::debug!(%topic, "last listener left");
            }
            Removal::Remaining | Removal::NotFound => {}
        }
    }

    // -- Inbound --

    /// Routes one inbound frame from the live link.
    pub(crate) fn dispatch(&self, frame: Frame) {
        match frame.command {
            Command::Message => self.deliver(frame),
            Command::Error => self.protocol_error(frame.to_server_error().to_string()),
            Command::Receipt => {
                tracing::debug!(receipt = ?frame.get("receipt-id"), "receipt");
            }
            other => {
                tracing::debug!(command = %other, "ignoring unexpected frame");
            }
        }
    }

    fn deliver(&self, frame: Frame) {
        let Some(sub) = frame.subscription() else {
            self.protocol_error("MESSAGE without a valid subscription header".to_string());
            return;
        };

        // Snapshot, then release the lock before any listener runs.
        let snapshot = self.lock().registry.listeners_for(sub);
        let Some((topic, listeners)) = snapshot else {
            // Late delivery for a subscription we already tore down.
            tracing::debug!(%sub, "message for unknown subscription dropped");
            self.emit(ConnectionEvent::ProtocolError(format!(
                "message for unknown subscription {sub}"
            )));
            return;
        };

        let body: Value = match self.codec.decode(&frame.body) {
            Ok(body) => body,
            Err(e) => {
                self.protocol_error(format!("undecodable body on {topic}: {e}"));
                return;
            }
        };

        tracing::debug!(%topic, listeners = listeners.len(), "delivering message");
        for listener in listeners {
            listener(&body);
        }
    }

    // -- Link lifecycle, driven by the connection worker --

    /// A new attempt is starting. Returns `false` if the worker is stale.
    pub(crate) fn begin_attempt(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.connection = ConnectionState::Connecting;
        true
    }

    /// The handshake succeeded: go live, replay every registered topic,
    /// then release the waiting callers. Returns `false` (touching
    /// nothing) if the attempt is stale.
    pub(crate) fn on_connected(&self, generation: u64, outbound: mpsc::UnboundedSender<Frame>) -> bool {
        let replayed = {
            let mut state = self.lock();
            if state.generation != generation {
                return false;
            }
            state.connection = ConnectionState::Connected;
            state.outbound = Some(outbound);

            let replay = state.registry.replay();
            for (sub, topic) in &replay {
                state.send(Frame::subscribe(*sub, topic));
            }
            if let Some(pending) = state.pending.take() {
                pending.send_replace(Some(Ok(())));
            }
            replay.len()
        };

        tracing::info!(topics = replayed, "connected");
        self.emit(ConnectionEvent::Connected);
        true
    }

    /// An attempt failed. Waiting callers get the error.
    pub(crate) fn on_connect_failed(&self, generation: u64, error: ConnectError, will_retry: bool) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.connection = ConnectionState::Disconnected;
        if let Some(pending) = state.pending.take() {
            pending.send_replace(Some(Err(error)));
        }
        if !will_retry {
            state.wake = None;
        }
        true
    }

    /// The live link dropped. Listeners stay registered; their protocol
    /// subscriptions are gone with the link.
    pub(crate) fn on_disconnected(&self, generation: u64, will_retry: bool) -> bool {
        let was_connected = {
            let mut state = self.lock();
            if state.generation != generation {
                return false;
            }
            let was_connected = state.connection == ConnectionState::Connected;
            state.connection = ConnectionState::Disconnected;
            state.outbound = None;
            state.registry.clear_live();
            if !will_retry {
                state.wake = None;
            }
            was_connected
        };

        if was_connected {
            self.emit(ConnectionEvent::Disconnected);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Multiplexer
// ---------------------------------------------------------------------------

/// Handle to the topic registry of one connection.
///
/// Cheap to clone; every clone talks to the same connection. Obtained from
/// [`ConnectionManager::multiplexer`](crate::ConnectionManager::multiplexer).
#[derive(Clone)]
pub struct Multiplexer {
    pub(crate) hub: Arc<Hub>,
}

impl Multiplexer {
    pub(crate) fn new() -> Self {
        Self {
            hub: Arc::new(Hub::new()),
        }
    }

    /// Registers `listener` on `topic` and returns its handle.
    ///
    /// The first listener of a topic opens the protocol subscription, right
    /// away if connected, otherwise on the next (re)connect.
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let listener: Listener = Arc::new(listener);

        let id = {
            let mut state = self.hub.lock();
            let (id, first) = state.registry.add(topic.clone(), listener);
            if first && state.connection == ConnectionState::Connected {
                if let Some(sub) = state.registry.open(&topic) {
                    state.send(Frame::subscribe(sub, &topic));
                    tracing::debug!(%topic, %sub, "subscribed");
                }
            }
            id
        };

        Subscription {
            hub: Arc::downgrade(&self.hub),
            topic,
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Like [`subscribe`](Self::subscribe), decoding each body into `T`
    /// first. Bodies that don't decode are logged and skipped.
    pub fn subscribe_to<T, F>(&self, topic: impl Into<Topic>, listener: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let name = topic.clone();
        self.subscribe(topic, move |body: &Value| match T::deserialize(body) {
            Ok(message) => listener(message),
            Err(e) => {
                tracing::warn!(topic = %name, error = %e, "dropping message with unexpected shape");
            }
        })
    }

    /// Sends `body` to `destination` on the live link.
    ///
    /// Returns `false` and sends nothing when not connected or when the
    /// body can't be encoded. Nothing is queued for later.
    pub fn publish<T: Serialize>(&self, destination: &str, body: &T) -> bool {
        let text = match self.hub.codec.encode(body) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(destination, error = %e, "could not encode message, not sent");
                return false;
            }
        };

        let state = self.hub.lock();
        if state.connection != ConnectionState::Connected {
            tracing::warn!(destination, "not connected, message not sent");
            return false;
        }
        let sent = state.send(Frame::send(destination, text));
        if !sent {
            tracing::warn!(destination, "link closing, message not sent");
        }
        sent
    }

    pub fn state(&self) -> ConnectionState {
        self.hub.lock().connection
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Subscribes to connectivity events.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.hub.events.subscribe()
    }

    /// Live protocol subscriptions for `topic`: 0 or 1.
    pub fn live_subscriptions(&self, topic: &Topic) -> usize {
        self.hub.lock().registry.live_count(topic)
    }

    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.hub.lock().registry.listener_count(topic)
    }
}

impl Publisher for Multiplexer {
    fn publish<T: Serialize>(&self, destination: &str, body: &T) -> bool {
        Multiplexer::publish(self, destination, body)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One listener registration.
///
/// [`unsubscribe`](Self::unsubscribe) is the only way to remove it; dropping
/// the handle leaves the listener in place.
pub struct Subscription {
    hub: Weak<Hub>,
    topic: Topic,
    id: ListenerId,
    active: AtomicBool,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Removes the listener. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(&self.topic, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
