use std::io;

/// Why a link could not be opened or used.
///
/// Every variant means the link is unusable; the connection manager logs
/// it and falls back to its reconnect policy.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone. Carries a short description for logs.
    #[error("link closed: {0}")]
    ConnectionClosed(String),

    #[error("could not dial: {0}")]
    ConnectFailed(#[source] io::Error),

    /// The dial outlived the connector's timeout.
    #[error("dial timed out")]
    Timeout,

    #[error("write failed: {0}")]
    SendFailed(#[source] io::Error),

    #[error("read failed: {0}")]
    ReceiveFailed(#[source] io::Error),
}
