//! Game-side logic for Gambit.
//!
//! Everything here is transport-agnostic: the session reacts to decoded
//! updates and hands outbound moves to a [`Publisher`], without knowing how
//! either travels.
//!
//! # Key types
//!
//! - [`GameSession`]: per-game state machine: authoritative board,
//!   clocks, lifecycle, status line, highlights
//! - [`Rules`]: the legality capability; [`StandardChess`] is the default
//! - [`Clocks`]: per-side remaining time with a display countdown
//! - [`RetryPolicy`] / [`lookup_with_retry`]: bounded initial fetch
//! - [`GameApi`]: the out-of-band HTTP actions, as a trait boundary
//!
//! # Flow
//!
//! ```text
//! UI gesture → GameSession::attempt_move → Rules::apply (speculative)
//!                                        → Publisher::publish("/app/move")
//! server echo → GameSession::handle_update → Rules replay → committed board
//! ```

#![allow(async_fn_in_trait)]

mod api;
mod chess;
mod clock;
mod error;
mod highlights;
mod lookup;
mod publish;
mod rules;
mod session;

pub use api::{GameApi, QueueResponse, QueueStatus};
pub use chess::StandardChess;
pub use clock::{format_clock, Clocks};
pub use error::{ApiError, RulesError};
pub use highlights::Highlights;
pub use lookup::{lookup_with_retry, GameLookup, LookupOutcome, RetryPolicy};
pub use publish::Publisher;
pub use rules::{CandidateMove, Destination, Rules, Side};
pub use session::{GameSession, GameStatus, MoveAttempt, SquareClick};
