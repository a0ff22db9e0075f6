//! Client configuration.

use std::time::Duration;

use gambit_protocol::Heartbeat;
use gambit_transport::ReconnectPolicy;

/// Socket endpoint used when nothing else is configured.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:8080/ws/websocket";

/// Environment variable overriding [`ClientConfig::url`].
pub const SOCKET_URL_ENV: &str = "GAMBIT_SOCKET_URL";

/// Environment variable providing [`ClientConfig::token`].
pub const TOKEN_ENV: &str = "GAMBIT_TOKEN";

/// Connection settings for a [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket URL of the STOMP endpoint.
    pub url: String,
    /// Virtual host announced in CONNECT.
    pub host: String,
    /// Heartbeat intervals offered to the server.
    pub heartbeat: Heartbeat,
    /// Background re-dial policy after a failed or dropped link.
    pub reconnect: ReconnectPolicy,
    /// Upper bound on dial plus handshake.
    pub connect_timeout: Duration,
    /// Bearer token sent with CONNECT.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOCKET_URL.to_string(),
            host: "localhost".to_string(),
            heartbeat: Heartbeat::default(),
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            token: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `GAMBIT_SOCKET_URL` and `GAMBIT_TOKEN` when
    /// set and non-empty. The CONNECT host follows the URL.
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(SOCKET_URL_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
        )
    }

    fn with_overrides(mut self, url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            if let Some(host) = host_of(&url) {
                self.host = host.to_string();
            }
            self.url = url.trim().to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
        self
    }
}

/// Host part of a URL: `ws://example.com:8080/ws` → `example.com`.
fn host_of(url: &str) -> Option<&str> {
    let rest = url.trim().split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?']).next()?;
    let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match authority.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => authority.split(':').next()?,
    };
    (!host.is_empty()).then_some(host)
}
