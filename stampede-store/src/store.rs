//! Core credential store trait

use async_trait::async_trait;

use crate::{Credential, StoreResult};

/// Shared credential store
///
/// Implementations are last-writer-wins per subject. Concurrent refreshes of
/// the same subject both produce valid credentials, so whichever lands last
/// is kept.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get the credential for a subject, `None` if the subject has never
    /// authenticated
    async fn get(&self, subject: &str) -> StoreResult<Option<Credential>>;

    /// Store a credential, replacing any existing one for its subject
    async fn put(&self, credential: Credential) -> StoreResult<()>;

    /// Remove a subject's credential, returning it if present
    async fn remove(&self, subject: &str) -> StoreResult<Option<Credential>>;

    /// Drop all credentials; runs once at test-run setup
    async fn clear(&self) -> StoreResult<()>;

    /// Number of stored credentials
    async fn len(&self) -> StoreResult<usize>;

    /// Whether the store is empty
    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }
}
