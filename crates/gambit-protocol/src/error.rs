//! Error types for the protocol layer.
//!
//! Each crate in Gambit defines its own error enum. When you see a
//! `ProtocolError`, the problem is in framing or payload decoding, not in
//! networking or game state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a frame body failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a frame body failed (malformed JSON, missing
    /// required fields, wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The text could not be parsed as a STOMP frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The frame's command line is not a STOMP command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A `heart-beat` header was not of the form `cx,cy`.
    #[error("invalid heart-beat header: {0}")]
    InvalidHeartbeat(String),

    /// The server sent an `ERROR` frame.
    #[error("server error: {message}")]
    Server {
        /// The `message` header of the ERROR frame.
        message: String,
        /// The ERROR frame body, if any.
        details: String,
    },
}
