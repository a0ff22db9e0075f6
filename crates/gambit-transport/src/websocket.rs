//! WebSocket transport implementation using `tokio-tungstenite`.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Connector, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A [`Connector`] that dials `ws://` / `wss://` URLs.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl WebSocketConnector {
    /// Creates a connector that gives up on a dial after `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(
        &self,
        url: &str,
    ) -> Result<Self::Connection, TransportError> {
        let (ws, _response) = tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url),
        )
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::next();
        tracing::debug!(%id, url, "WebSocket connection established");

        // Reader and writer halves get separate locks: a task parked in
        // `recv` must not stop heartbeats or SEND frames from going out.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single client-side WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &str) -> Result<(), TransportError> {
        let msg = Message::Text(data.to_owned().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    let text = String::from_utf8(data.to_vec()).map_err(|e| {
                        TransportError::ReceiveFailed(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            e,
                        ))
                    })?;
                    return Ok(Some(text));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
