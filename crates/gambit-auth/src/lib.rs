//! Credentials and auth state for Gambit.
//!
//! The game server authenticates every HTTP call and the socket handshake
//! with a bearer token obtained at login. This crate keeps that token (and
//! the username it belongs to) across restarts:
//!
//! 1. **Credentials** ([`Credentials`], [`UserProfile`]): what gets stored
//! 2. **Stores** ([`CredentialStore`] trait, [`FileCredentialStore`],
//!    [`MemoryCredentialStore`]): where it gets stored
//! 3. **State** ([`AuthState`]): the in-memory view the rest of the client
//!    reads, with the clearing rules for logout and rejected tokens
//!
//! # How it fits in the stack
//!
//! ```text
//! gambit (above)  ← attaches the token to requests, clears it on 401
//!     ↕
//! Auth layer (this crate)  ← owns the token and its file
//! ```

mod credentials;
mod error;
mod state;
mod store;

pub use credentials::{Credentials, UserProfile};
pub use error::AuthError;
pub use state::AuthState;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
