//! The in-memory auth state.
//!
//! [`AuthState`] is read on every outbound request (to attach the bearer
//! token) and written rarely (login, logout, rejected token). It mirrors the
//! store: whatever it holds in memory is also what's persisted, except when
//! persisting fails, in which case memory still reflects the user's intent
//! and the failure is logged.
//!
//! ## Lifecycle
//!
//! ```text
//! load() ──→ [LoggedOut] ──login()──→ [LoggedIn]
//!                ▲                        │
//!                └── logout() / handle_unauthorized()
//! ```

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{AuthError, CredentialStore, Credentials, UserProfile};

/// Current credentials backed by a [`CredentialStore`].
///
/// Shared by reference (usually inside an `Arc`); all methods take `&self`.
pub struct AuthState<S: CredentialStore> {
    store: S,
    current: RwLock<Option<Credentials>>,
}

impl<S: CredentialStore> AuthState<S> {
    /// Reads the store once.
    ///
    /// Never fails: an empty store means logged out, and so does a store
    /// that can't be read (logged at `warn`).
    pub fn load(store: S) -> Self {
        let current = match store.load() {
            Ok(Some(creds)) => match creds.validate() {
                Ok(()) => {
                    tracing::info!(username = %creds.user.username, "restored credentials");
                    Some(creds)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored credentials incomplete, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored credentials, starting logged out");
                None
            }
        };

        Self {
            store,
            current: RwLock::new(current),
        }
    }

    /// Stores fresh credentials after a successful login.
    ///
    /// # Errors
    /// [`AuthError::Incomplete`] for blank credentials (nothing changes),
    /// or the store's error if persisting fails (memory is updated anyway,
    /// so the current run stays logged in).
    pub fn login(&self, credentials: Credentials) -> Result<(), AuthError> {
        credentials.validate()?;
        let persisted = self.store.save(&credentials);
        tracing::info!(username = %credentials.user.username, "logged in");
        *self.write() = Some(credentials);
        persisted
    }

    /// Forgets the credentials in memory and in the store.
    pub fn logout(&self) {
        let previous = self.write().take();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to remove stored credentials");
        }
        if let Some(creds) = previous {
            tracing::info!(username = %creds.user.username, "logged out");
        }
    }

    /// The server rejected our token: clear everything so the next call
    /// goes out unauthenticated and the user is asked to log in again.
    pub fn handle_unauthorized(&self) {
        if self.is_authenticated() {
            tracing::warn!("server rejected credentials, clearing them");
        }
        self.logout();
    }

    /// The bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|c| c.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Direct access to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // Poisoning only means another thread panicked mid-assignment of an
    // `Option`; the value is still whole.
    fn read(&self) -> RwLockReadGuard<'_, Option<Credentials>> {
        self.current.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Credentials>> {
        self.current.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileCredentialStore, MemoryCredentialStore};

    fn creds() -> Credentials {
        Credentials::new("jwt-abc", UserProfile::new("ana"))
    }

    #[test]
    fn test_load_empty_store_is_logged_out() {
        let auth = AuthState::load(MemoryCredentialStore::new());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.token(), None);
    }

    #[test]
    fn test_load_restores_persisted_credentials() {
        let auth = AuthState::load(MemoryCredentialStore::with(creds()));
        assert_eq!(auth.token().as_deref(), Some("jwt-abc"));
        assert_eq!(auth.user().map(|u| u.username), Some("ana".to_string()));
    }

    #[test]
    fn test_load_corrupt_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "garbage").unwrap();

        let auth = AuthState::load(FileCredentialStore::new(&path));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_login_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let auth = AuthState::load(FileCredentialStore::new(&path));
        auth.login(creds()).unwrap();

        let reloaded = AuthState::load(FileCredentialStore::new(&path));
        assert_eq!(reloaded.token().as_deref(), Some("jwt-abc"));
    }

    #[test]
    fn test_login_blank_token_changes_nothing() {
        let auth = AuthState::load(MemoryCredentialStore::new());
        let result = auth.login(Credentials::new("", UserProfile::new("ana")));
        assert!(matches!(result, Err(AuthError::Incomplete(_))));
        assert!(!auth.is_authenticated());
        assert!(auth.store().load().unwrap().is_none());
    }

    #[test]
    fn test_logout_clears_memory_and_store() {
        let auth = AuthState::load(MemoryCredentialStore::with(creds()));
        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(auth.store().load().unwrap().is_none());
    }

    #[test]
    fn test_handle_unauthorized_clears_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&creds()).unwrap();

        let auth = AuthState::load(store);
        auth.handle_unauthorized();

        assert!(!auth.is_authenticated());
        assert!(!auth.store().path().exists());
    }
}
