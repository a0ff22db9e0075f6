//! Wire protocol for Gambit.
//!
//! This crate defines the "language" the client speaks with the game
//! server:
//!
//! - **Frames** ([`Frame`], [`Command`], [`Inbound`]): STOMP 1.2 text
//!   frames: the subscribe/publish envelope every message travels in.
//! - **Heartbeats** ([`Heartbeat`]): the keep-alive intervals each side
//!   offers and how they are negotiated.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frame bodies are
//!   converted to/from Rust types.
//! - **Types** ([`GameUpdate`], [`MoveRequest`], [`ChatMessage`], [`Topic`],
//!   etc.): the payloads carried inside frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while framing or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw text) and the connection
//! manager (topics and listeners). It doesn't know about connections; it
//! only knows how to turn frames into text and back.
//!
//! ```text
//! Transport (text) → Protocol (Frame → body) → Multiplexer (topic → listeners)
//! ```

mod codec;
mod error;
mod frame;
mod heartbeat;
mod topic;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use frame::{Command, Frame, Inbound, SubscriptionId};
pub use heartbeat::Heartbeat;
pub use topic::{destinations, Topic};
pub use types::{
    ChatKind, ChatMessage, GameId, GameSnapshot, GameUpdate, MatchFound,
    MoveRequest, QueueTimeout, UpdateKind,
};
