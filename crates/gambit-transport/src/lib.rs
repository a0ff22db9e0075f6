//! Transport abstraction layer for Gambit.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! the physical link a client uses to reach the game server. The layers
//! above only ever see "a connection that can send and receive text
//! frames". They never touch sockets directly.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`
//! - `memory`: in-process transport for tests and local tooling

mod error;
#[cfg(feature = "memory")]
mod memory;
mod reconnect;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::{memory_transport, MemoryConnection, MemoryConnector, MemoryListener};
pub use reconnect::ReconnectPolicy;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide id of one physical link.
///
/// A reconnect yields a new id, so log lines from before and after a drop
/// can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocates the next id. Ids start at 1 and never repeat.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Opens new outbound connections.
///
/// The connection manager owns one connector and calls it once per
/// physical attempt. Futures are `Send` so the manager's worker task can
/// drive any connector.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Dials `url` and returns an open connection.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single duplex, message-oriented connection.
///
/// Messages are whole text frames: the transport never splits or merges
/// them. `send` and `recv` take `&self` so one task can wait for inbound
/// data while another writes.
pub trait Connection: Send + Sync + 'static {
    /// Sends one whole message.
    fn send(
        &self,
        data: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next message. `Ok(None)` once the peer has closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn id(&self) -> ConnectionId;
}
