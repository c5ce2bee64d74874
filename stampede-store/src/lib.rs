//! Shared credential storage for Stampede
//!
//! All virtual users of a run read and write tokens through one store, so a
//! credential obtained by any worker is immediately visible to every other
//! worker impersonating the same subject. Two backends are provided: an
//! in-process map for single-process runs and a JSON file for seeding
//! pipelines that span processes.

pub mod credential;
pub mod errors;
pub mod store;
pub mod stores;

// Re-export main types
pub use credential::Credential;
pub use errors::{StoreError, StoreResult};
pub use store::CredentialStore;

// Re-export store implementations
pub use stores::{FileStore, MemoryStore};

/// Create the default in-memory store
pub fn create_default_store() -> MemoryStore {
    MemoryStore::new()
}
