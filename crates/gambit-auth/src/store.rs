//! Where credentials live between runs.
//!
//! [`CredentialStore`] is the seam: [`FileCredentialStore`] for real use,
//! [`MemoryCredentialStore`] for tests and for embedders that keep the token
//! somewhere else (a keychain, an environment variable).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{AuthError, Credentials};

/// Persistent home for one set of credentials.
///
/// Calls are synchronous: the payload is a few hundred bytes and is touched
/// only at startup, login and logout.
pub trait CredentialStore: Send + Sync + 'static {
    /// Reads the stored credentials. `Ok(None)` means nothing is stored.
    ///
    /// # Errors
    /// [`AuthError::Corrupt`] if something is stored but unreadable,
    /// [`AuthError::Io`] for filesystem failures.
    fn load(&self) -> Result<Option<Credentials>, AuthError>;

    /// Replaces whatever is stored.
    fn save(&self, credentials: &Credentials) -> Result<(), AuthError>;

    /// Removes the stored credentials. Clearing an empty store is not an
    /// error.
    fn clear(&self) -> Result<(), AuthError>;
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// Stores credentials as a JSON file.
///
/// The default location is `<config dir>/gambit/credentials.json`
/// (`~/.config` on Linux, `~/Library/Application Support` on macOS,
/// `%APPDATA%` on Windows).
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at the platform default location.
    ///
    /// # Errors
    /// [`AuthError::NoConfigDir`] if the platform has no config directory.
    pub fn default_location() -> Result<Self, AuthError> {
        let dir = dirs::config_dir().ok_or(AuthError::NoConfigDir)?;
        Ok(Self::new(dir.join("gambit").join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, AuthError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let credentials: Credentials =
            serde_json::from_str(&text).map_err(AuthError::Corrupt)?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text =
            serde_json::to_string_pretty(credentials).map_err(AuthError::Encode)?;

        // Write beside the target and rename so a crash never leaves a
        // half-written file behind.
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// Keeps credentials in memory only.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `credentials`.
    pub fn with(credentials: Credentials) -> Self {
        Self {
            slot: Mutex::new(Some(credentials)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credentials>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, AuthError> {
        Ok(self.slot().clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        *self.slot() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserProfile;

    fn creds() -> Credentials {
        Credentials::new("jwt-abc", UserProfile::new("ana"))
    }

    #[test]
    fn test_file_store_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_save_creates_parent_dirs_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            FileCredentialStore::new(dir.path().join("nested/gambit/credentials.json"));

        store.save(&creds()).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), Some(creds()));
    }

    #[test]
    fn test_file_store_load_corrupt_file_returns_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let result = FileCredentialStore::new(&path).load();
        assert!(matches!(result, Err(AuthError::Corrupt(_))));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&creds()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_save_then_clear() {
        let store = MemoryCredentialStore::new();
        store.save(&creds()).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds()));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
