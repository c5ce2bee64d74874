//! Resilient platform API client for Stampede
//!
//! The executor in this crate is the hot path of every virtual user: it
//! attaches credentials from the shared [`TokenSource`], classifies failures
//! against configured allow-lists and retries with a linear backoff. Typed
//! actor and admin clients sit on top and only describe request shapes.
//!
//! [`TokenSource`]: stampede_auth::TokenSource

pub mod admin;
pub mod api;
pub mod classify;
pub mod envelope;
pub mod errors;
pub mod executor;
pub mod observer;
pub mod request;
pub mod types;

// Re-export main types
pub use admin::AdminClient;
pub use api::ActorClient;
pub use classify::{Classification, Classifier, TransportKind};
pub use envelope::{Envelope, Page, PageMeta, SUCCESS_CODE};
pub use errors::{ClientError, ClientResult};
pub use executor::{RequestExecutor, Sleeper, TokioSleeper};
pub use observer::{FanoutObserver, NoopObserver, ProgressTicker, RetryObserver};
pub use request::ApiRequest;
