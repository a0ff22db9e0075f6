//! Error types for the auth layer.

/// Errors that can occur while reading or writing credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The credential file could not be read, written or removed.
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The credential file exists but does not hold valid credentials.
    #[error("credential file is corrupt: {0}")]
    Corrupt(serde_json::Error),

    /// Serializing credentials failed.
    #[error("failed to encode credentials: {0}")]
    Encode(serde_json::Error),

    /// The platform has no per-user configuration directory.
    #[error("no configuration directory on this platform")]
    NoConfigDir,

    /// Login was attempted with an empty token or username.
    #[error("incomplete credentials: {0}")]
    Incomplete(&'static str),
}
