//! The STOMP session over one physical link.
//!
//! [`establish`] performs the CONNECT/CONNECTED handshake; [`run`] then owns
//! the link until it ends, multiplexing four things:
//!
//! 1. Inbound text from the transport, decoded and handed to the hub
//! 2. Outbound frames queued by `publish`/`subscribe`/`unsubscribe`
//! 3. Outgoing heartbeats on the negotiated interval
//! 4. The inbound watchdog: silence for twice the negotiated incoming
//!    interval counts as a dropped link

use std::fmt;
use std::future::pending;
use std::time::Duration;

use gambit_protocol::{Command, Frame, Heartbeat, Inbound};
use gambit_transport::{Connection, Connector};
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use crate::multiplexer::Hub;
use crate::{ClientConfig, ConnectError};

/// A heartbeat on the wire is a bare end-of-line.
const HEARTBEAT: &str = "\n";

/// A handshaken link.
pub(crate) struct Link<T> {
    pub(crate) conn: T,
    /// Negotiated intervals, in our orientation.
    pub(crate) heartbeat: Heartbeat,
    /// The server's `server` header, if sent.
    pub(crate) server: Option<String>,
}

/// Why [`run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DisconnectReason {
    /// The server closed the transport.
    ClosedByServer,
    /// Sending or receiving failed.
    Transport(String),
    /// No inbound traffic within twice the incoming heartbeat interval.
    HeartbeatTimeout,
    /// The outbound channel closed: `disconnect()` was called.
    Local,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedByServer => f.write_str("closed by server"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::HeartbeatTimeout => f.write_str("heartbeat timeout"),
            Self::Local => f.write_str("closed locally"),
        }
    }
}

/// Dials `config.url` and completes the STOMP handshake, all within
/// `config.connect_timeout`.
pub(crate) async fn establish<C: Connector>(
    connector: &C,
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<Link<C::Connection>, ConnectError> {
    match tokio::time::timeout(config.connect_timeout, handshake(connector, config, token)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectError::Timeout),
    }
}

async fn handshake<C: Connector>(
    connector: &C,
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<Link<C::Connection>, ConnectError> {
    let conn = connector
        .connect(&config.url)
        .await
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    let hello = Frame::connect(&config.host, config.heartbeat, token);
    let answer = match conn.send(&hello.encode()).await {
        Ok(()) => await_connected(&conn, config.heartbeat).await,
        Err(e) => Err(ConnectError::Transport(e.to_string())),
    };

    match answer {
        Ok((heartbeat, server)) => {
            tracing::debug!(
                conn = %conn.id(),
                outgoing_ms = heartbeat.outgoing.as_millis() as u64,
                incoming_ms = heartbeat.incoming.as_millis() as u64,
                server = server.as_deref().unwrap_or("unknown"),
                "handshake complete"
            );
            Ok(Link {
                conn,
                heartbeat,
                server,
            })
        }
        Err(e) => {
            if let Err(close_err) = conn.close().await {
                tracing::debug!(error = %close_err, "close after failed handshake");
            }
            Err(e)
        }
    }
}

async fn await_connected<T: Connection>(
    conn: &T,
    offer: Heartbeat,
) -> Result<(Heartbeat, Option<String>), ConnectError> {
    loop {
        let text = match conn.recv().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                return Err(ConnectError::Transport("closed during handshake".to_string()));
            }
            Err(e) => return Err(ConnectError::Transport(e.to_string())),
        };

        let frame = match Inbound::decode(&text) {
            Ok(Inbound::Heartbeat) => continue,
            Ok(Inbound::Frame(frame)) => frame,
            Err(e) => return Err(ConnectError::Handshake(e.to_string())),
        };

        return match frame.command {
            Command::Connected => {
                let server_beat = frame
                    .get("heart-beat")
                    .map(Heartbeat::parse)
                    .transpose()
                    .map_err(|e| ConnectError::Handshake(e.to_string()))?;
                Ok((
                    offer.negotiate(server_beat),
                    frame.get("server").map(str::to_owned),
                ))
            }
            Command::Error => Err(ConnectError::Rejected(
                frame.get("message").unwrap_or("no reason given").to_string(),
            )),
            other => Err(ConnectError::Handshake(format!(
                "expected CONNECTED, got {other}"
            ))),
        };
    }
}

/// Drives a live link until it ends. Always closes the transport.
pub(crate) async fn run<T: Connection>(
    link: Link<T>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    hub: &Hub,
) -> DisconnectReason {
    let Link { conn, heartbeat, .. } = link;

    let mut beat = heartbeat_timer(heartbeat.outgoing);
    let silence = (!heartbeat.incoming.is_zero()).then(|| heartbeat.incoming * 2);
    let mut last_seen = Instant::now();

    let reason = loop {
        let deadline = silence.map(|window| last_seen + window);

        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(text)) => {
                    last_seen = Instant::now();
                    handle_inbound(&text, hub);
                }
                Ok(None) => break DisconnectReason::ClosedByServer,
                Err(e) => break DisconnectReason::Transport(e.to_string()),
            },

            frame = outbound.recv() => match frame {
                Some(frame) => {
                    tracing::debug!(command = %frame.command, destination = ?frame.destination(), "sending frame");
                    if let Err(e) = conn.send(&frame.encode()).await {
                        break DisconnectReason::Transport(e.to_string());
                    }
                    // Any frame counts as proof of life.
                    if let Some(timer) = beat.as_mut() {
                        timer.reset();
                    }
                }
                None => {
                    if let Err(e) = conn.send(&Frame::disconnect().encode()).await {
                        tracing::debug!(error = %e, "could not send DISCONNECT");
                    }
                    break DisconnectReason::Local;
                }
            },

            () = tick(beat.as_mut()) => {
                if let Err(e) = conn.send(HEARTBEAT).await {
                    break DisconnectReason::Transport(e.to_string());
                }
            },

            () = expire(deadline) => break DisconnectReason::HeartbeatTimeout,
        }
    };

    if let Err(e) = conn.close().await {
        tracing::debug!(conn = %conn.id(), error = %e, "close failed");
    }
    reason
}

fn handle_inbound(text: &str, hub: &Hub) {
    match Inbound::decode(text) {
        Ok(Inbound::Heartbeat) => tracing::trace!("heartbeat received"),
        Ok(Inbound::Frame(frame)) => hub.dispatch(frame),
        Err(e) => hub.protocol_error(format!("malformed frame: {e}")),
    }
}

fn heartbeat_timer(every: Duration) -> Option<Interval> {
    if every.is_zero() {
        return None;
    }
    let mut timer = interval_at(Instant::now() + every, every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(timer)
}

async fn tick(timer: Option<&mut Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
