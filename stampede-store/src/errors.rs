//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store-related errors
///
/// A lookup miss is not an error; `get` returns `Ok(None)` for unknown
/// subjects. Errors here mean the backend itself failed, which is fatal for
/// the request that triggered the write.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the file backend
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Backend-specific error
    #[error("Store backend error: {0}")]
    BackendError(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            StoreError::DeserializationError(err.to_string())
        } else {
            StoreError::SerializationError(err.to_string())
        }
    }
}
