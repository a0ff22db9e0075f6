//! Finding an opponent.
//!
//! Matchmaking is split across both channels: joining and leaving the
//! queue are HTTP calls, while the pairing (or the server giving up) is
//! pushed on two per-user topics. [`MatchmakingWatcher`] turns those topics
//! into a stream of [`MatchEvent`]s; [`Matchmaker`] runs the whole flow.

use std::sync::Arc;
use std::time::Duration;

use gambit_auth::CredentialStore;
use gambit_game::{GameApi, QueueResponse, QueueStatus};
use gambit_protocol::{GameId, MatchFound, QueueTimeout, Topic};
use tokio::sync::mpsc;

use crate::{AuthorizedApi, GambitError, Multiplexer, Subscription};

/// How long to wait in the queue before giving up locally.
pub const QUEUE_TIMEOUT: Duration = Duration::from_secs(90);

/// Shown when the server's timeout notice carries no text, or when the
/// local timeout fires first.
pub const NO_OPPONENT: &str = "No opponent found. Please try again.";

/// A matchmaking notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    Found(MatchFound),
    Timeout(QueueTimeout),
}

/// Listens on `/user/queue/match-found` and `/user/queue/timeout`.
///
/// Events are buffered until read. Dropping the watcher unsubscribes both
/// topics.
pub struct MatchmakingWatcher {
    events: mpsc::UnboundedReceiver<MatchEvent>,
    subscriptions: [Subscription; 2],
}

impl MatchmakingWatcher {
    pub fn open(mux: &Multiplexer) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        let found = {
            let tx = tx.clone();
            mux.subscribe_to(Topic::match_found(), move |found: MatchFound| {
                tracing::info!(game_id = %found.game_id, "match found");
                let _ = tx.send(MatchEvent::Found(found));
            })
        };
        let timeout = mux.subscribe_to(Topic::queue_timeout(), move |notice: QueueTimeout| {
            tracing::info!("matchmaking timed out");
            let _ = tx.send(MatchEvent::Timeout(notice));
        });

        Self {
            events,
            subscriptions: [found, timeout],
        }
    }

    /// The next event. `None` once the listeners are gone (the connection
    /// manager was reset).
    pub async fn recv(&mut self) -> Option<MatchEvent> {
        self.events.recv().await
    }
}

impl Drop for MatchmakingWatcher {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// A successful pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub game_id: GameId,
    pub opponent: Option<String>,
    /// `"white"` or `"black"`, when known.
    pub color: Option<String>,
    pub time_control: Option<String>,
}

impl MatchInfo {
    fn from_response(response: QueueResponse) -> Result<Self, GambitError> {
        let game_id = response
            .game_id
            .ok_or_else(|| GambitError::Matchmaking("matched without a game id".to_string()))?;
        Ok(Self {
            game_id,
            opponent: response.opponent,
            color: response.color,
            time_control: response.time_control,
        })
    }

    /// Reads our side and opponent off the broadcast, given our username.
    fn from_found(found: MatchFound, me: Option<&str>) -> Self {
        let (opponent, color) = match me {
            Some(me) if me == found.white_player => (Some(found.black_player), Some("white")),
            Some(me) if me == found.black_player => (Some(found.white_player), Some("black")),
            _ => (None, None),
        };
        Self {
            game_id: found.game_id,
            opponent,
            color: color.map(str::to_string),
            time_control: Some(found.time_control),
        }
    }
}

/// How a matchmaking round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(MatchInfo),
    /// No opponent; carries the message to show.
    TimedOut(String),
}

/// Runs one queue round: enqueue, wait for a pairing, leave on timeout.
pub struct Matchmaker<A: GameApi, S: CredentialStore> {
    api: Arc<AuthorizedApi<A, S>>,
    mux: Multiplexer,
    queue_timeout: Duration,
}

impl<A: GameApi, S: CredentialStore> Matchmaker<A, S> {
    pub fn new(api: Arc<AuthorizedApi<A, S>>, mux: &Multiplexer) -> Self {
        Self {
            api,
            mux: mux.clone(),
            queue_timeout: QUEUE_TIMEOUT,
        }
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    /// Queues for `time_control` and waits for the outcome.
    ///
    /// The topics are watched before the queue is joined, so a pairing
    /// pushed while the HTTP call is still in flight is not missed. If
    /// nothing arrives within the queue timeout the queue is left.
    pub async fn find_match(&self, time_control: &str) -> Result<MatchOutcome, GambitError> {
        let mut watcher = MatchmakingWatcher::open(&self.mux);

        let response = self.api.enqueue(time_control).await?;
        match response.status {
            QueueStatus::Matched => {
                return MatchInfo::from_response(response).map(MatchOutcome::Matched);
            }
            QueueStatus::Waiting => {
                tracing::info!(
                    time_control,
                    position = ?response.queue_position,
                    "waiting for an opponent"
                );
            }
            other => {
                let message = response
                    .message
                    .unwrap_or_else(|| format!("unexpected queue status {other:?}"));
                return Err(GambitError::Matchmaking(message));
            }
        }

        match tokio::time::timeout(self.queue_timeout, watcher.recv()).await {
            Ok(Some(MatchEvent::Found(found))) => {
                let me = self.api.auth().user().map(|u| u.username);
                Ok(MatchOutcome::Matched(MatchInfo::from_found(found, me.as_deref())))
            }
            Ok(Some(MatchEvent::Timeout(notice))) => {
                let message = if notice.message.trim().is_empty() {
                    NO_OPPONENT.to_string()
                } else {
                    notice.message
                };
                Ok(MatchOutcome::TimedOut(message))
            }
            Ok(None) => Err(GambitError::Matchmaking("connection reset".to_string())),
            Err(_) => {
                tracing::info!(time_control, "queue timeout, leaving queue");
                self.leave().await?;
                Ok(MatchOutcome::TimedOut(NO_OPPONENT.to_string()))
            }
        }
    }

    /// Leaves the queue.
    pub async fn leave(&self) -> Result<(), GambitError> {
        self.api.dequeue().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found() -> MatchFound {
        MatchFound {
            game_id: GameId(5),
            white_player: "alice".into(),
            black_player: "bob".into(),
            time_control: "BLITZ".into(),
        }
    }

    #[test]
    fn test_from_found_as_black() {
        let info = MatchInfo::from_found(found(), Some("bob"));
        assert_eq!(info.opponent.as_deref(), Some("alice"));
        assert_eq!(info.color.as_deref(), Some("black"));
        assert_eq!(info.time_control.as_deref(), Some("BLITZ"));
    }

    #[test]
    fn test_from_found_unknown_user_leaves_sides_open() {
        let info = MatchInfo::from_found(found(), None);
        assert_eq!(info.game_id, GameId(5));
        assert!(info.opponent.is_none());
        assert!(info.color.is_none());
    }

    #[test]
    fn test_from_response_without_game_id_is_error() {
        let response = QueueResponse {
            status: QueueStatus::Matched,
            game_id: None,
            opponent: None,
            color: None,
            time_control: None,
            message: None,
            queue_position: None,
        };
        assert!(matches!(
            MatchInfo::from_response(response),
            Err(GambitError::Matchmaking(_))
        ));
    }

    #[test]
    fn test_watcher_drop_unsubscribes_both_topics() {
        let mux = Multiplexer::new();
        {
            let _watcher = MatchmakingWatcher::open(&mux);
            assert_eq!(mux.listener_count(&Topic::match_found()), 1);
            assert_eq!(mux.listener_count(&Topic::queue_timeout()), 1);
        }
        assert_eq!(mux.listener_count(&Topic::match_found()), 0);
        assert_eq!(mux.listener_count(&Topic::queue_timeout()), 0);
    }
}
