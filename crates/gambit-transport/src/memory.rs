//! In-process transport built on Tokio channels.
//!
//! [`memory_transport`] returns a connected `(MemoryConnector,
//! MemoryListener)` pair. Every `connect` on the connector creates a fresh
//! duplex channel pair and hands the server end to the listener, so tests
//! can script a server without opening sockets.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, Mutex};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Creates a connector and the listener that receives its connections.
pub fn memory_transport() -> (MemoryConnector, MemoryListener) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    let connector = MemoryConnector {
        accept_tx,
        attempts: Arc::new(AtomicUsize::new(0)),
    };
    (connector, MemoryListener { accept_rx })
}

/// Client half of the in-memory transport.
#[derive(Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryConnection>,
    attempts: Arc<AtomicUsize>,
}

impl MemoryConnector {
    /// Number of times `connect` has been called, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        _url: &str,
    ) -> Result<Self::Connection, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let (client, server) = MemoryConnection::pair();
        self.accept_tx.send(server).map_err(|_| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "memory listener dropped",
            ))
        })?;
        Ok(client)
    }
}

/// Server half of the in-memory transport.
pub struct MemoryListener {
    accept_rx: mpsc::UnboundedReceiver<MemoryConnection>,
}

impl MemoryListener {
    /// Waits for the next connection. Returns `None` once every connector
    /// clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryConnection> {
        self.accept_rx.recv().await
    }
}

/// One end of an in-memory duplex link.
pub struct MemoryConnection {
    id: ConnectionId,
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<String>>>,
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl MemoryConnection {
    fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let id = ConnectionId::next();
        let a = Self {
            id,
            tx: std::sync::Mutex::new(Some(a_tx)),
            rx: Mutex::new(b_rx),
        };
        let b = Self {
            id,
            tx: std::sync::Mutex::new(Some(b_tx)),
            rx: Mutex::new(a_rx),
        };
        (a, b)
    }

    fn sender(&self) -> Option<mpsc::UnboundedSender<String>> {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &str) -> Result<(), TransportError> {
        let tx = self.sender().ok_or_else(|| {
            TransportError::ConnectionClosed("closed locally".into())
        })?;
        tx.send(data.to_owned()).map_err(|_| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer dropped",
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping our sender ends the peer's `recv` with `None`.
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
