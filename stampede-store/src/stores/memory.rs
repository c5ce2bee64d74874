//! In-memory credential store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{Credential, CredentialStore, StoreResult};

/// In-process credential store
///
/// Clones share the underlying map, so one `MemoryStore` handed to every
/// virtual-user task gives the whole run a single credential namespace.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Credential>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, subject: &str) -> StoreResult<Option<Credential>> {
        Ok(self.entries.read().get(subject).cloned())
    }

    async fn put(&self, credential: Credential) -> StoreResult<()> {
        self.entries
            .write()
            .insert(credential.subject.clone(), credential);
        Ok(())
    }

    async fn remove(&self, subject: &str) -> StoreResult<Option<Credential>> {
        Ok(self.entries.write().remove(subject))
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.write().clear();
        Ok(())
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().len())
    }
}
