//! The HTTP boundary.
//!
//! Out-of-band actions (creating, joining, resigning, matchmaking) go over
//! plain request/response calls, not the socket. No HTTP client ships with
//! Gambit: embedders implement [`GameApi`] with whatever client they use,
//! and every method receives the bearer token to attach.

use std::future::Future;

use gambit_protocol::{GameId, GameSnapshot};
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Where a player stands in the matchmaking queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    /// Paired; `game_id` is set.
    Matched,
    /// Queued; a match will arrive on the match-found topic.
    Waiting,
    /// Left the queue.
    Left,
    NotInQueue,
}

/// Response to a create/enqueue call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    /// `"white"` or `"black"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
}

/// Request/response game actions.
///
/// `bearer` is the stored token, or `None` when logged out. Implementations
/// must map HTTP 401 to [`ApiError::Unauthorized`]; callers rely on it to
/// clear stale credentials.
pub trait GameApi: Send + Sync + 'static {
    /// Creates a game, or joins a player already waiting for one.
    fn create_game(
        &self,
        bearer: Option<&str>,
        time_control: &str,
    ) -> impl Future<Output = Result<QueueResponse, ApiError>> + Send;

    /// Joins a specific game.
    fn join_game(
        &self,
        bearer: Option<&str>,
        game_id: GameId,
    ) -> impl Future<Output = Result<GameSnapshot, ApiError>> + Send;

    fn fetch_game(
        &self,
        bearer: Option<&str>,
        game_id: GameId,
    ) -> impl Future<Output = Result<GameSnapshot, ApiError>> + Send;

    fn resign(
        &self,
        bearer: Option<&str>,
        game_id: GameId,
    ) -> impl Future<Output = Result<GameSnapshot, ApiError>> + Send;

    fn undo(
        &self,
        bearer: Option<&str>,
        game_id: GameId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Enters the matchmaking queue.
    fn enqueue(
        &self,
        bearer: Option<&str>,
        time_control: &str,
    ) -> impl Future<Output = Result<QueueResponse, ApiError>> + Send;

    /// Leaves the matchmaking queue.
    fn dequeue(&self, bearer: Option<&str>) -> impl Future<Output = Result<(), ApiError>> + Send;
}
