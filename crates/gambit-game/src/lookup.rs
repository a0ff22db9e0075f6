//! The initial game lookup, with bounded retries.
//!
//! A freshly matched game may not be ready when the board opens: the second
//! player's join can still be in flight, so the server reports `WAITING`.
//! The lookup waits a moment before the first fetch and then polls a few
//! times. If no fetch ever succeeds, the caller falls back to a locally
//! assumed game (see [`GameSession::apply_fallback`](crate::GameSession::apply_fallback)).

use std::future::Future;
use std::time::Duration;

use gambit_protocol::{GameId, GameSnapshot};

use crate::ApiError;

/// Fetches a game's current state.
pub trait GameLookup: Send + Sync + 'static {
    fn fetch(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<GameSnapshot, ApiError>> + Send;
}

/// How long to wait and how often to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first fetch.
    pub initial_delay: Duration,
    /// Delay between fetches after that.
    pub retry_delay: Duration,
    /// Retries after the first fetch.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            retry_delay: Duration::from_secs(1),
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Total fetches, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// How a lookup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The last snapshot fetched. Its status may still be `WAITING` if the
    /// retries ran out.
    Found(GameSnapshot),
    /// Every fetch failed.
    Fallback,
}

/// Runs the lookup.
///
/// Every successful fetch is passed to `on_snapshot` as it arrives. Polling
/// continues while fetches fail or the game reports `WAITING`, up to
/// `policy.max_attempts()` fetches.
pub async fn lookup_with_retry<L, F>(
    lookup: &L,
    game_id: GameId,
    policy: RetryPolicy,
    mut on_snapshot: F,
) -> LookupOutcome
where
    L: GameLookup,
    F: FnMut(&GameSnapshot),
{
    tokio::time::sleep(policy.initial_delay).await;

    let mut last: Option<GameSnapshot> = None;
    for attempt in 1..=policy.max_attempts() {
        if attempt > 1 {
            tokio::time::sleep(policy.retry_delay).await;
        }

        match lookup.fetch(game_id).await {
            Ok(snapshot) => {
                on_snapshot(&snapshot);
                let waiting = snapshot.status.as_deref() == Some("WAITING");
                last = Some(snapshot);
                if !waiting {
                    break;
                }
                tracing::debug!(%game_id, attempt, "game still waiting for players");
            }
            // The server has spoken; retrying with the same token won't help.
            Err(ApiError::Unauthorized) => {
                tracing::warn!(%game_id, "game lookup unauthorized");
                break;
            }
            Err(e) => {
                tracing::debug!(%game_id, attempt, error = %e, "game lookup failed");
            }
        }
    }

    match last {
        Some(snapshot) => LookupOutcome::Found(snapshot),
        None => LookupOutcome::Fallback,
    }
}
