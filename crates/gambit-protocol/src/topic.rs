//! Topic and destination naming.

use std::fmt;

use crate::GameId;

/// A named broadcast stream the server routes MESSAGE frames through.
///
/// Topics are opaque strings; the constructors encode the server's naming
/// convention so callers never format paths by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Authoritative updates for one game: `/topic/game/{id}`.
    pub fn game(id: GameId) -> Self {
        Self(format!("/topic/game/{id}"))
    }

    /// Chat for one game: `/topic/game/{id}/chat`.
    pub fn game_chat(id: GameId) -> Self {
        Self(format!("/topic/game/{id}/chat"))
    }

    /// Per-user matchmaking result.
    pub fn match_found() -> Self {
        Self("/user/queue/match-found".to_string())
    }

    /// Per-user matchmaking timeout.
    pub fn queue_timeout() -> Self {
        Self("/user/queue/timeout".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Application destinations the client SENDs to.
pub mod destinations {
    /// Move submissions.
    pub const MOVE: &str = "/app/move";
    /// Chat messages.
    pub const CHAT: &str = "/app/chat";
}
