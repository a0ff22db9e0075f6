//! STOMP 1.2 text frames.
//!
//! Every message between client and server is a frame:
//!
//! ```text
//! COMMAND
//! header1:value1
//! header2:value2
//!
//! body^@
//! ```
//!
//! `^@` is the NUL byte that terminates the frame. A message consisting only
//! of end-of-line characters is a heartbeat, not a frame.

use std::fmt;
use std::str::FromStr;

use crate::{Heartbeat, ProtocolError, Topic};

/// The STOMP protocol version this crate speaks.
pub const STOMP_VERSION: &str = "1.2";

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The command line of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // -- Client → Server --
    Connect,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,

    // -- Server → Client --
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    /// Returns the wire spelling of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Connected => "CONNECTED",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    /// CONNECT and CONNECTED frames carry their headers unescaped, for
    /// compatibility with STOMP 1.0 peers.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" | "STOMP" => Ok(Self::Connect),
            "SEND" => Ok(Self::Send),
            "SUBSCRIBE" => Ok(Self::Subscribe),
            "UNSUBSCRIBE" => Ok(Self::Unsubscribe),
            "DISCONNECT" => Ok(Self::Disconnect),
            "CONNECTED" => Ok(Self::Connected),
            "MESSAGE" => Ok(Self::Message),
            "RECEIPT" => Ok(Self::Receipt),
            "ERROR" => Ok(Self::Error),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubscriptionId
// ---------------------------------------------------------------------------

/// Identifies one protocol-level subscription on one connection.
///
/// The client picks the id in its SUBSCRIBE frame and the server echoes it
/// in the `subscription` header of every MESSAGE it routes through that
/// subscription. Rendered as `sub-{n}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl SubscriptionId {
    /// Parses the wire form (`sub-12`). Returns `None` for ids this client
    /// never issued.
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix("sub-")?.parse().ok().map(Self)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One STOMP frame.
///
/// Headers keep their wire order; when a header repeats, the first
/// occurrence wins (STOMP 1.2 §"Repeated Header Entries").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    /// Creates a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of header `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    // -- Builders for the frames a client sends --

    /// The opening CONNECT frame.
    pub fn connect(host: &str, heartbeat: Heartbeat, token: Option<&str>) -> Self {
        let mut frame = Self::new(Command::Connect)
            .header("accept-version", STOMP_VERSION)
            .header("host", host)
            .header("heart-beat", heartbeat.to_header());
        if let Some(token) = token {
            frame = frame.header("Authorization", format!("Bearer {token}"));
        }
        frame
    }

    /// SUBSCRIBE `topic` under subscription `id`.
    pub fn subscribe(id: SubscriptionId, topic: &Topic) -> Self {
        Self::new(Command::Subscribe)
            .header("id", id.to_string())
            .header("destination", topic.as_str())
            .header("ack", "auto")
    }

    /// UNSUBSCRIBE subscription `id`.
    pub fn unsubscribe(id: SubscriptionId) -> Self {
        Self::new(Command::Unsubscribe).header("id", id.to_string())
    }

    /// SEND a JSON `body` to `destination`.
    pub fn send(destination: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .body(body)
    }

    /// Polite goodbye before closing the transport.
    pub fn disconnect() -> Self {
        Self::new(Command::Disconnect)
    }

    // -- Accessors for the frames a server sends --

    /// The `destination` header.
    pub fn destination(&self) -> Option<&str> {
        self.get("destination")
    }

    /// The `subscription` header of a MESSAGE frame, parsed.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.get("subscription").and_then(SubscriptionId::parse)
    }

    /// Converts an ERROR frame into a [`ProtocolError::Server`].
    pub fn to_server_error(&self) -> ProtocolError {
        ProtocolError::Server {
            message: self.get("message").unwrap_or("unknown error").to_string(),
            details: self.body.clone(),
        }
    }

    /// Serializes the frame to its wire text, NUL terminator included.
    ///
    /// A `content-length` header is added for non-empty bodies unless one
    /// is already present.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');

        let escape = self.command.escapes_headers();
        for (name, value) in &self.headers {
            if escape {
                push_escaped(&mut out, name);
                out.push(':');
                push_escaped(&mut out, value);
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str("content-length:");
            out.push_str(&self.body.len().to_string());
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One decoded transport message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A bare end-of-line: the peer is alive.
    Heartbeat,
    /// A full frame.
    Frame(Frame),
}

impl Inbound {
    /// Parses one transport message.
    ///
    /// Leading end-of-line characters (heartbeats sent just before a frame)
    /// are skipped.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedFrame`] for structural problems,
    /// [`ProtocolError::UnknownCommand`] for an unknown command line.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut cursor = text.trim_start_matches(['\r', '\n']);
        if cursor.is_empty() {
            return Ok(Self::Heartbeat);
        }

        let command_line = next_line(&mut cursor)
            .ok_or_else(|| malformed("missing end of command line"))?;
        let command: Command = command_line.parse()?;

        let mut headers = Vec::new();
        loop {
            let line = next_line(&mut cursor)
                .ok_or_else(|| malformed("unterminated header block"))?;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| malformed(&format!("header without colon: {line}")))?;
            if command.escapes_headers() {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| malformed(&format!("bad content-length: {v}")))
            })
            .transpose()?;

        let body = match content_length {
            Some(len) => {
                let terminated = cursor.len() > len
                    && cursor.is_char_boundary(len)
                    && cursor.as_bytes()[len] == 0;
                if !terminated {
                    return Err(malformed("body shorter than content-length"));
                }
                &cursor[..len]
            }
            None => {
                let end = cursor
                    .find('\0')
                    .ok_or_else(|| malformed("missing NUL terminator"))?;
                &cursor[..end]
            }
        };

        Ok(Self::Frame(Frame {
            command,
            headers,
            body: body.to_string(),
        }))
    }
}

fn malformed(reason: &str) -> ProtocolError {
    ProtocolError::MalformedFrame(reason.to_string())
}

/// Pops one line (without its `\n` / `\r\n`) off the front of `cursor`.
fn next_line<'a>(cursor: &mut &'a str) -> Option<&'a str> {
    let idx = cursor.find('\n')?;
    let line = &cursor[..idx];
    *cursor = &cursor[idx + 1..];
    Some(line.strip_suffix('\r').unwrap_or(line))
}

fn push_escaped(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
}

fn unescape(raw: &str) -> Result<String, ProtocolError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(malformed(&format!(
                    "invalid escape sequence \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

// =========================================================================
// Tests
// =========================================================================
