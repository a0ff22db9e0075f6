//! The outbound seam between a session and the connection.

use serde::Serialize;

/// Something that can put one message on the wire right now.
///
/// Implementations must not queue: `false` means the message was dropped
/// (not connected, or the body could not be encoded) and will never be
/// sent.
pub trait Publisher {
    fn publish<T: Serialize>(&self, destination: &str, body: &T) -> bool;
}
