//! Authentication layer for Stampede
//!
//! Speaks the identity provider's token protocol, keeps the shared
//! credential store warm, and hands out per-virtual-user sessions. The
//! [`TokenSource`] is the single entry point for "give me a usable token for
//! this subject": it collapses concurrent first-time logins for one subject
//! into a single provider call, so ramping a thousand virtual users does not
//! stampede the identity provider.

pub mod errors;
pub mod http;
pub mod provider;
pub mod session;
pub mod token_source;

// Re-export main types
pub use errors::{AuthError, AuthResult};
pub use http::build_http_client;
pub use provider::{AuthenticationResult, IdentityProvider};
pub use session::Session;
pub use token_source::TokenSource;
