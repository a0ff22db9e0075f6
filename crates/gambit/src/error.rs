//! Unified error type for the Gambit client.

use gambit_auth::AuthError;
use gambit_game::{ApiError, RulesError};
use gambit_protocol::ProtocolError;
use gambit_transport::TransportError;

/// Why a `connect()` call failed.
///
/// Cloneable: every caller waiting on the same in-flight attempt receives
/// its own copy of the one outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The transport could not be opened or broke during the handshake.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered the handshake with an ERROR frame.
    #[error("server rejected connection: {0}")]
    Rejected(String),

    /// The server answered with something other than CONNECTED.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// No CONNECTED frame within the configured timeout.
    #[error("handshake timed out")]
    Timeout,

    /// `disconnect()` was called while the attempt was in flight.
    #[error("connection attempt aborted")]
    Aborted,
}

/// Why a chat message was refused before reaching the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    Empty,

    #[error("message is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("not connected, message not sent")]
    NotConnected,
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    /// A transport-level error (dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Credential storage failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An HTTP call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A move or position was rejected by the rules.
    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The match-found stream ended before a match or timeout arrived.
    #[error("matchmaking interrupted: {0}")]
    Matchmaking(String),
}
