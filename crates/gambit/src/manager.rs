//! `ConnectionManager` builder and connection worker.
//!
//! This is the entry point of the client. It owns the one physical link to
//! the game server and ties the layers together: transport → protocol
//! client → multiplexer.
//!
//! # Lifecycle
//!
//! ```text
//!                 connect()
//! [Disconnected] ──────────→ [Connecting] ──handshake ok──→ [Connected]
//!       ▲                         │                              │
//!       └──── handshake failed ───┘                              │
//!       └──────────────── link dropped / disconnect() ───────────┘
//! ```
//!
//! At most one background worker exists per manager. It dials, runs the
//! link, and after a failure or drop sleeps for the [`ReconnectPolicy`]
//! delay before dialing again. `connect()` during that sleep wakes it
//! early instead of starting a second worker.
//!
//! [`ReconnectPolicy`]: gambit_transport::ReconnectPolicy

use std::sync::{Arc, RwLock};
use std::time::Duration;

use gambit_protocol::Heartbeat;
use gambit_transport::{Connection, Connector, ReconnectPolicy};
use tokio::sync::{broadcast, mpsc, watch, Notify};

use crate::client::{self, DisconnectReason};
use crate::multiplexer::ConnectionState;
use crate::{ClientConfig, ConnectError, ConnectionEvent, Multiplexer};

/// Shared manager state passed to the worker task.
struct Inner<C: Connector> {
    connector: C,
    config: ClientConfig,
    token: RwLock<Option<String>>,
    mux: Multiplexer,
}

impl<C: Connector> Inner<C> {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Builder for a [`ConnectionManager`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use gambit::ConnectionManagerBuilder;
/// use gambit_transport::{ReconnectPolicy, WebSocketConnector};
///
/// let manager = ConnectionManagerBuilder::new()
///     .url("ws://localhost:8080/ws/websocket")
///     .reconnect(ReconnectPolicy::fixed(Duration::from_secs(5)))
///     .build(WebSocketConnector::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionManagerBuilder {
    config: ClientConfig,
}

impl ConnectionManagerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Virtual host sent in CONNECT.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Bearer token sent in CONNECT.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.config.heartbeat = heartbeat;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Builds the manager. Nothing is dialed until [`ConnectionManager::connect`].
    pub fn build<C: Connector>(self, connector: C) -> ConnectionManager<C> {
        let token = self.config.token.clone();
        ConnectionManager {
            inner: Arc::new(Inner {
                connector,
                config: self.config,
                token: RwLock::new(token),
                mux: Multiplexer::new(),
            }),
        }
    }
}

/// Handle to the shared realtime connection.
///
/// Cheap to clone; clones share the link, the topic registry and the
/// worker. Must be used from within a Tokio runtime.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Brings the link up, or joins the attempt already in flight.
    ///
    /// Concurrent callers share one physical attempt and all observe its
    /// outcome. A failure is returned here and retried in the background
    /// per the reconnect policy; this call itself never retries.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let mut done = {
            let hub = &self.inner.mux.hub;
            let mut state = hub.lock();
            match state.connection {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting => state
                    .pending
                    .get_or_insert_with(|| watch::channel(None).0)
                    .subscribe(),
                ConnectionState::Disconnected => {
                    state.connection = ConnectionState::Connecting;
                    let (tx, rx) = watch::channel(None);
                    state.pending = Some(tx);

                    match state.wake.clone() {
                        Some(wake) => wake.notify_one(),
                        None => {
                            let wake = Arc::new(Notify::new());
                            state.wake = Some(Arc::clone(&wake));
                            let inner = Arc::clone(&self.inner);
                            let generation = state.generation;
                            tokio::spawn(worker(inner, generation, wake));
                        }
                    }
                    rx
                }
            }
        };

        match done.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or(Err(ConnectError::Aborted)),
            // The signal was dropped without an outcome.
            Err(_) => Err(ConnectError::Aborted),
        }
    }

    /// Tears everything down: closes the link, forgets every listener and
    /// stops the worker. Callers still waiting in `connect()` get
    /// [`ConnectError::Aborted`]; an attempt still in flight is discarded
    /// when it completes.
    pub fn disconnect(&self) {
        let hub = &self.inner.mux.hub;
        let was_connected = {
            let mut state = hub.lock();
            state.generation += 1;
            let was_connected = state.connection == ConnectionState::Connected;
            state.connection = ConnectionState::Disconnected;
            // Closing the channel makes the link task send DISCONNECT.
            state.outbound = None;
            state.registry.clear();
            if let Some(pending) = state.pending.take() {
                pending.send_replace(Some(Err(ConnectError::Aborted)));
            }
            if let Some(wake) = state.wake.take() {
                wake.notify_one();
            }
            was_connected
        };

        tracing::info!("disconnected");
        if was_connected {
            hub.emit(ConnectionEvent::Disconnected);
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.mux.state()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.mux.is_connected()
    }

    /// Subscribes to connectivity events.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.mux.events()
    }

    /// The topic registry of this connection.
    pub fn multiplexer(&self) -> &Multiplexer {
        &self.inner.mux
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Replaces the token used by the next handshake. The live link, if
    /// any, keeps the credentials it was opened with.
    pub fn set_token(&self, token: Option<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }
}

/// The connection worker: dial, run, back off, repeat, until the policy
/// gives up or `disconnect()` makes this generation stale.
async fn worker<C: Connector>(inner: Arc<Inner<C>>, generation: u64, wake: Arc<Notify>) {
    let hub = &inner.mux.hub;
    let policy = &inner.config.reconnect;
    let mut failures: u32 = 0;

    loop {
        if !hub.begin_attempt(generation) {
            return;
        }

        let token = inner.token();
        tracing::debug!(url = %inner.config.url, attempt = failures + 1, "dialing");

        let delay = match client::establish(&inner.connector, &inner.config, token.as_deref()).await {
            Ok(link) => {
                let conn_id = link.conn.id();
                let (tx, rx) = mpsc::unbounded_channel();
                if !hub.on_connected(generation, tx) {
                    tracing::debug!(conn = %conn_id, "discarding link from a stale attempt");
                    if let Err(e) = link.conn.close().await {
                        tracing::debug!(conn = %conn_id, error = %e, "close of stale link failed");
                    }
                    return;
                }
                failures = 0;
                tracing::info!(
                    conn = %conn_id,
                    server = link.server.as_deref().unwrap_or("unknown"),
                    "link up"
                );

                let reason = client::run(link, rx, hub).await;
                if reason == DisconnectReason::Local {
                    return;
                }
                tracing::warn!(conn = %conn_id, %reason, "link dropped");

                let delay = policy.delay_for(0);
                if !hub.on_disconnected(generation, delay.is_some()) {
                    return;
                }
                delay
            }
            Err(e) => {
                tracing::warn!(url = %inner.config.url, error = %e, "connection attempt failed");
                let delay = policy.delay_for(failures);
                failures = failures.saturating_add(1);
                if !hub.on_connect_failed(generation, e, delay.is_some()) {
                    return;
                }
                delay
            }
        };

        let Some(delay) = delay else {
            tracing::info!("reconnect policy exhausted, staying disconnected");
            return;
        };
        tracing::debug!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = wake.notified() => {}
        }
    }
}
