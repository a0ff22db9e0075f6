//! Error types for the game layer.

use gambit_protocol::GameId;

/// Why the rules capability refused something.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The position string could not be parsed, or describes an
    /// impossible position.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// A move string is not coordinate notation (`e2e4`, `e7e8q`).
    #[error("invalid move notation: {0}")]
    InvalidNotation(String),

    /// The move is well-formed but not legal in the position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Errors returned by the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the bearer credential (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The game does not exist.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// Any other non-success response.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not what we expected.
    #[error("unexpected response body: {0}")]
    Decode(String),
}
