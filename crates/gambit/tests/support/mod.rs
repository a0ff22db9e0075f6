//! A scripted STOMP broker on the in-memory transport.
//!
//! Speaks just enough STOMP for the client: answers CONNECT (optionally
//! after a hold, or with an ERROR), records SUBSCRIBE/UNSUBSCRIBE/SEND,
//! and pushes MESSAGE frames to whichever live subscriptions match a
//! destination.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use gambit::{ConnectionManager, ConnectionManagerBuilder};
use gambit_protocol::{Command, Frame, Inbound};
use gambit_transport::{memory_transport, Connection, MemoryConnection, MemoryConnector, MemoryListener, ReconnectPolicy};
use tokio::sync::watch;

/// Installs a test subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct BrokerState {
    /// Open server-side connections by key.
    live: HashMap<u64, Arc<MemoryConnection>>,
    /// (connection key, subscription id) → destination.
    subscriptions: HashMap<(u64, String), String>,
    accepted: usize,
    pending_handshakes: usize,
    reject_next: Option<String>,
    heartbeat: Option<String>,
    connect_frames: Vec<Frame>,
    subscribes: Vec<String>,
    unsubscribes: usize,
    sent: Vec<(String, String)>,
    heartbeats: usize,
    next_message: u64,
}

struct Shared {
    state: Mutex<BrokerState>,
    hold: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Clone)]
pub struct Broker {
    shared: Arc<Shared>,
}

impl Broker {
    /// Starts accepting connections from `listener`.
    pub fn start(mut listener: MemoryListener) -> Self {
        let (hold, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            state: Mutex::new(BrokerState::default()),
            hold,
        });

        let accept = Arc::clone(&shared);
        tokio::spawn(async move {
            let mut key = 0u64;
            while let Some(conn) = listener.accept().await {
                key += 1;
                let conn = Arc::new(conn);
                {
                    let mut state = accept.lock();
                    state.accepted += 1;
                    state.live.insert(key, Arc::clone(&conn));
                }
                tokio::spawn(serve(Arc::clone(&accept), conn, key));
            }
        });

        Self { shared }
    }

    // -- Scripting --

    /// CONNECT frames wait until [`release_handshakes`](Self::release_handshakes).
    pub fn hold_handshakes(&self) {
        self.shared.hold.send_replace(true);
    }

    pub fn release_handshakes(&self) {
        self.shared.hold.send_replace(false);
    }

    /// The next CONNECT is answered with an ERROR frame.
    pub fn reject_next(&self, message: &str) {
        self.shared.lock().reject_next = Some(message.to_string());
    }

    /// `heart-beat` header for CONNECTED. Defaults to `0,0`.
    pub fn set_heartbeat(&self, header: &str) {
        self.shared.lock().heartbeat = Some(header.to_string());
    }

    /// Sends `body` to every live subscription on `destination`. Returns
    /// how many MESSAGE frames went out.
    pub async fn push(&self, destination: &str, body: &str) -> usize {
        let targets: Vec<(Arc<MemoryConnection>, String, u64)> = {
            let mut state = self.shared.lock();
            let matches: Vec<(u64, String)> = state
                .subscriptions
                .iter()
                .filter(|(_, dest)| dest.as_str() == destination)
                .map(|((key, id), _)| (*key, id.clone()))
                .collect();
            matches
                .into_iter()
                .filter_map(|(key, id)| {
                    let conn = state.live.get(&key).cloned()?;
                    state.next_message += 1;
                    Some((conn, id, state.next_message))
                })
                .collect()
        };

        let mut delivered = 0;
        for (conn, id, message_id) in targets {
            let frame = Frame::new(Command::Message)
                .header("subscription", id)
                .header("message-id", message_id.to_string())
                .header("destination", destination)
                .header("content-type", "application/json")
                .body(body);
            if conn.send(&frame.encode()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Sends raw text on every live connection.
    pub async fn push_raw(&self, text: &str) {
        let conns: Vec<_> = self.shared.lock().live.values().cloned().collect();
        for conn in conns {
            let _ = conn.send(text).await;
        }
    }

    /// Drops every connection from the server side.
    pub async fn kill_all(&self) {
        let conns: Vec<_> = self.shared.lock().live.values().cloned().collect();
        for conn in conns {
            let _ = conn.close().await;
        }
    }

    // -- Observations --

    pub fn pending_handshakes(&self) -> usize {
        self.shared.lock().pending_handshakes
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.lock().accepted
    }

    pub fn live_connections(&self) -> usize {
        self.shared.lock().live.len()
    }

    /// Subscriptions on `destination` across live connections.
    pub fn active_subscriptions(&self, destination: &str) -> usize {
        self.shared
            .lock()
            .subscriptions
            .values()
            .filter(|d| d.as_str() == destination)
            .count()
    }

    /// SUBSCRIBE frames ever received for `destination`.
    pub fn total_subscribes(&self, destination: &str) -> usize {
        self.shared
            .lock()
            .subscribes
            .iter()
            .filter(|d| d.as_str() == destination)
            .count()
    }

    pub fn total_unsubscribes(&self) -> usize {
        self.shared.lock().unsubscribes
    }

    /// Bodies SENT to `destination`, in order.
    pub fn sent_to(&self, destination: &str) -> Vec<String> {
        self.shared
            .lock()
            .sent
            .iter()
            .filter(|(d, _)| d == destination)
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn connect_frames(&self) -> Vec<Frame> {
        self.shared.lock().connect_frames.clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.shared.lock().heartbeats
    }
}

async fn serve(shared: Arc<Shared>, conn: Arc<MemoryConnection>, key: u64) {
    while let Ok(Some(text)) = conn.recv().await {
        let frame = match Inbound::decode(&text) {
            Ok(Inbound::Frame(frame)) => frame,
            Ok(Inbound::Heartbeat) => {
                shared.lock().heartbeats += 1;
                continue;
            }
            Err(_) => continue,
        };

        match frame.command {
            Command::Connect => {
                shared.lock().pending_handshakes += 1;
                let mut hold = shared.hold.subscribe();
                let _ = hold.wait_for(|held| !held).await;

                let (reject, heartbeat) = {
                    let mut state = shared.lock();
                    state.pending_handshakes -= 1;
                    state.connect_frames.push(frame.clone());
                    (state.reject_next.take(), state.heartbeat.clone())
                };

                if let Some(message) = reject {
                    let error = Frame::new(Command::Error).header("message", message);
                    let _ = conn.send(&error.encode()).await;
                    let _ = conn.close().await;
                    break;
                }
                let connected = Frame::new(Command::Connected)
                    .header("version", "1.2")
                    .header("server", "scripted-broker")
                    .header("heart-beat", heartbeat.unwrap_or_else(|| "0,0".to_string()));
                if conn.send(&connected.encode()).await.is_err() {
                    break;
                }
            }
            Command::Subscribe => {
                let (Some(id), Some(dest)) = (frame.get("id"), frame.destination()) else {
                    continue;
                };
                let mut state = shared.lock();
                state.subscriptions.insert((key, id.to_string()), dest.to_string());
                state.subscribes.push(dest.to_string());
            }
            Command::Unsubscribe => {
                if let Some(id) = frame.get("id") {
                    let mut state = shared.lock();
                    state.subscriptions.remove(&(key, id.to_string()));
                    state.unsubscribes += 1;
                }
            }
            Command::Send => {
                if let Some(dest) = frame.destination() {
                    shared.lock().sent.push((dest.to_string(), frame.body.clone()));
                }
            }
            Command::Disconnect => break,
            _ => {}
        }
    }

    let mut state = shared.lock();
    state.live.remove(&key);
    state.subscriptions.retain(|(k, _), _| *k != key);
}

/// A manager wired to a fresh broker, plus a connector clone for counting
/// dial attempts.
pub fn harness(reconnect: ReconnectPolicy) -> (ConnectionManager<MemoryConnector>, MemoryConnector, Broker) {
    init_tracing();
    let (connector, listener) = memory_transport();
    let broker = Broker::start(listener);
    let manager = ConnectionManagerBuilder::new()
        .url("memory://broker")
        .reconnect(reconnect)
        .build(connector.clone());
    (manager, connector, broker)
}

/// Polls `check` every 10 ms until it holds, failing after 2 s.
pub async fn eventually<F: FnMut() -> bool>(what: &str, mut check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Awaits `fut` for at most 2 s.
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("timed out")
}
