//! Payloads carried in frame bodies.
//!
//! Field names follow the server's JSON (camelCase). Where the server has
//! two names for the same value (its game-state DTO and its broadcast map
//! disagree), both are accepted via `#[serde(alias)]`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Server-assigned game identifier.
///
/// `#[serde(transparent)]` keeps it a bare number on the wire. `Display`
/// prints the bare number too, since it is spliced into topic paths.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game updates (server → client on /topic/game/{id})
// ---------------------------------------------------------------------------

/// Kind of a game-topic broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    /// A move was accepted; position and clocks changed.
    Move,
    /// The game ended.
    GameOver,
    /// The server rejected something; board and lifecycle are unchanged.
    Error,
}

/// An authoritative update for one game.
///
/// Clocks are remaining seconds per side. `ERROR` updates usually omit
/// them, hence `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,

    /// Space-separated coordinate moves from the start position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,

    #[serde(default, alias = "whiteTimeRemaining", skip_serializing_if = "Option::is_none")]
    pub white_time_left: Option<i64>,

    #[serde(default, alias = "blackTimeRemaining", skip_serializing_if = "Option::is_none")]
    pub black_time_left: Option<i64>,

    /// `"w"` or `"b"`.
    #[serde(default)]
    pub current_turn: String,

    /// Server lifecycle status (`IN_PROGRESS`, `COMPLETED`, ...).
    #[serde(default)]
    pub status: String,

    #[serde(default, alias = "statusMessage", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Game state as returned by the HTTP fetch. Everything but the id may be
/// missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSnapshot {
    pub id: GameId,
    pub white_player_id: Option<u64>,
    pub black_player_id: Option<u64>,
    pub white_player_name: Option<String>,
    pub black_player_name: Option<String>,
    pub fen: Option<String>,
    pub pgn: Option<String>,
    pub status: Option<String>,
    pub current_turn: Option<String>,
    pub time_control: Option<String>,
    #[serde(alias = "whiteTimeLeft")]
    pub white_time_remaining: Option<i64>,
    #[serde(alias = "blackTimeLeft")]
    pub black_time_remaining: Option<i64>,
    #[serde(alias = "message")]
    pub status_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Moves (client → server on /app/move)
// ---------------------------------------------------------------------------

/// A move submission. Squares are algebraic (`"e2"`), promotion a piece
/// letter that the server ignores for non-promoting moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub game_id: GameId,
    pub from: String,
    pub to: String,
    pub promotion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl MoveRequest {
    pub fn new(game_id: GameId, from: &str, to: &str, promotion: char) -> Self {
        Self {
            game_id,
            from: from.to_string(),
            to: to.to_string(),
            promotion: promotion.to_string(),
            username: None,
        }
    }

    /// Attaches the sender's username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Chat (both directions)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatKind {
    /// Typed by a player.
    Chat,
    /// Server notice (player joined, left).
    System,
    /// Game narration (check, resignation).
    GameEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub game_id: GameId,
    pub sender: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Server-stamped; absent on outbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// An outbound player message.
    pub fn chat(game_id: GameId, sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            game_id,
            sender: sender.into(),
            message: message.into(),
            kind: ChatKind::Chat,
            timestamp: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Matchmaking (server → client on /user/queue/*)
// ---------------------------------------------------------------------------

/// The matchmaker paired us with an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    pub game_id: GameId,
    pub white_player: String,
    pub black_player: String,
    pub time_control: String,
}

/// The matchmaker gave up on us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTimeout {
    #[serde(default)]
    pub message: String,
}
