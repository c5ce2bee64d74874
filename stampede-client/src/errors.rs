//! Client error types

use crate::classify::TransportKind;
use stampede_auth::AuthError;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the request executor and the typed clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// Token acquisition or refresh failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request never produced a response and the failure kind is not
    /// in the transient allow-list
    #[error("Transport failure ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// The retry bound was reached on a retryable failure that does not
    /// qualify for the transport escape valve
    #[error("Request failed after {attempts} retries: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// The platform answered with an error code outside every allow-list
    #[error("Unexpected error code from platform: {code} (status {status})")]
    UnexpectedStatus {
        status: u16,
        code: String,
        body: String,
    },

    /// A successful response did not match the expected envelope shape
    #[error("Response did not match the expected shape: {0}")]
    MalformedResponse(String),

    /// The operation needs a payload but the response carried none
    #[error("Response carried no data for {context}")]
    MissingData { context: &'static str },

    /// A request URL could not be assembled
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
