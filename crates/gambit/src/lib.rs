//! # Gambit
//!
//! Realtime client layer for two-player online chess.
//!
//! One [`ConnectionManager`] owns the single STOMP-over-WebSocket link to
//! the game server. Every feature shares it through the [`Multiplexer`]:
//! the board ([`LiveGame`]), the chat panel ([`ChatRoom`]) and matchmaking
//! ([`MatchmakingWatcher`], [`Matchmaker`]) each listen on their own topic,
//! and their registrations survive reconnects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gambit::prelude::*;
//!
//! # struct Lookup;
//! # impl GameLookup for Lookup {
//! #     async fn fetch(&self, _: GameId) -> Result<GameSnapshot, ApiError> {
//! #         Err(ApiError::Network("offline".into()))
//! #     }
//! # }
//! # async fn demo() -> Result<(), GambitError> {
//! let manager = ConnectionManagerBuilder::new()
//!     .config(ClientConfig::from_env())
//!     .build(WebSocketConnector::default());
//! manager.connect().await?;
//!
//! let game = LiveGame::open(
//!     manager.multiplexer(),
//!     GameId(42),
//!     StandardChess,
//!     Arc::new(Lookup),
//!     LiveGameConfig::default(),
//! );
//! game.attempt_move("e2", "e4");
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! gambit-transport  →  gambit-protocol  →  gambit (this crate)  ←  gambit-game
//!   (text link)          (STOMP frames)      (link + topics)        (rules, session)
//! ```

#![allow(async_fn_in_trait)]

mod api;
mod chat;
mod client;
mod config;
mod error;
mod live;
mod manager;
mod matchmaking;
mod multiplexer;
mod registry;

pub use api::AuthorizedApi;
pub use chat::{ChatRoom, ANONYMOUS, MAX_CHAT_LEN};
pub use config::{ClientConfig, DEFAULT_SOCKET_URL, SOCKET_URL_ENV, TOKEN_ENV};
pub use error::{ChatError, ConnectError, GambitError};
pub use live::{LiveGame, LiveGameConfig};
pub use manager::{ConnectionManager, ConnectionManagerBuilder};
pub use matchmaking::{
    MatchEvent, MatchInfo, MatchOutcome, Matchmaker, MatchmakingWatcher, NO_OPPONENT,
    QUEUE_TIMEOUT,
};
pub use multiplexer::{ConnectionEvent, ConnectionState, Multiplexer, Subscription};
pub use registry::{Listener, ListenerId, Removal, SubscriptionRegistry};

/// Re-exports of the types most applications need.
pub mod prelude {
    pub use crate::{
        AuthorizedApi, ChatError, ChatRoom, ClientConfig, ConnectError, ConnectionEvent,
        ConnectionManager, ConnectionManagerBuilder, ConnectionState, GambitError, LiveGame,
        LiveGameConfig, MatchEvent, MatchOutcome, Matchmaker, MatchmakingWatcher, Multiplexer,
        Subscription,
    };
    pub use gambit_auth::{AuthState, CredentialStore, Credentials, FileCredentialStore, UserProfile};
    pub use gambit_game::{
        ApiError, GameApi, GameLookup, GameSession, GameStatus, MoveAttempt, RetryPolicy, Rules,
        SquareClick, StandardChess,
    };
    pub use gambit_protocol::{ChatMessage, GameId, GameSnapshot, GameUpdate, Topic};
    pub use gambit_transport::{ReconnectPolicy, WebSocketConnector};
}
