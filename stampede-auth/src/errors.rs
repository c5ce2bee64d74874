//! Authentication error types

use thiserror::Error;

/// Result type for authentication operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login retries exhausted without obtaining a token
    #[error("Cannot get token for user: {username}")]
    TokenUnavailable { username: String },

    /// Refresh retries exhausted
    #[error("Cannot refresh token for user: {username}")]
    RefreshFailed { username: String },

    /// The provider explicitly rejected the credentials; retrying cannot
    /// succeed
    #[error("Credentials rejected for user {username}: {reason}")]
    CredentialsRejected { username: String, reason: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Credential store failure
    #[error("Store error: {0}")]
    Store(#[from] stampede_store::StoreError),
}
