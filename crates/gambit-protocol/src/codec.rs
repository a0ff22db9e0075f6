//! Codec trait and implementations for frame bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and the text that
//! travels in a frame body. The frame layer doesn't care how a body is
//! serialized; it just needs something that implements [`Codec`].
//!
//! The game server speaks JSON, so [`JsonCodec`] is the only
//! implementation shipped.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to frame bodies and back.
///
/// `Send + Sync + 'static` so a single codec value can live inside the
/// long-running connection task and be used from listener callbacks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame body.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame body back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the body is malformed or does
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, body: &str)
    -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use gambit_protocol::{Codec, JsonCodec, MoveRequest, GameId};
///
/// let codec = JsonCodec;
/// let request = MoveRequest::new(GameId(1), "e2", "e4", 'q');
///
/// let body = codec.encode(&request).unwrap();
/// let decoded: MoveRequest = codec.decode(&body).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        body: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(body).map_err(ProtocolError::Decode)
    }
}
