use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }
}

/// A bearer token plus the profile it was issued for.
///
/// Both halves are required: a token without a user (or the reverse) is
/// treated as logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: UserProfile,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Rejects credentials with a blank token or username.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::Incomplete("token is empty"));
        }
        if self.user.username.trim().is_empty() {
            return Err(AuthError::Incomplete("username is empty"));
        }
        Ok(())
    }
}
