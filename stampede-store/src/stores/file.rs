//! File-backed credential store
//!
//! Keeps the whole credential map in one JSON document. Writes go through a
//! temp file and an atomic rename, so a concurrently running process never
//! observes a torn document. Intended for seeding pipelines where several
//! short-lived processes share one token namespace; in-process access is
//! serialized with a mutex.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::{Credential, CredentialStore, StoreResult};

/// JSON-file credential store
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the given path; the file is created lazily
    /// on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<HashMap<String, Credential>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &HashMap<String, Credential>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, subject: &str) -> StoreResult<Option<Credential>> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries.get(subject).cloned())
    }

    async fn put(&self, credential: Credential) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(credential.subject.clone(), credential);
        self.persist(&entries).await
    }

    async fn remove(&self, subject: &str) -> StoreResult<Option<Credential>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let removed = entries.remove(subject);
        if removed.is_some() {
            self.persist(&entries).await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        self.persist(&HashMap::new()).await
    }

    async fn len(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.len())
    }
}
