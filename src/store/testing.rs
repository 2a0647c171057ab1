//! Document store doubles shared by the store and pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::backend::{Change, Document, DocumentStore, MemoryDocumentStore, StoreError};

/// An in-memory store that accepts a fixed number of writes and rejects
/// every write after that.  Reads always succeed.
pub struct FailingWrites {
    inner: MemoryDocumentStore,
    writes_left: AtomicUsize,
}

impl FailingWrites {
    pub fn after(writes: usize) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            writes_left: AtomicUsize::new(writes),
        }
    }

    /// Rejects every write.
    pub fn offline() -> Self {
        Self::after(0)
    }

    /// Budget the writes that follow, leaving existing documents in place.
    pub fn allow(&self, writes: usize) {
        self.writes_left.store(writes, Ordering::SeqCst);
    }

    fn spend(&self) -> Result<(), StoreError> {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::PersistenceUnavailable("offline".into()))
    }
}

#[async_trait]
impl DocumentStore for FailingWrites {
    async fn set(&self, path: &str, doc: Document) -> Result<(), StoreError> {
        self.spend()?;
        self.inner.set(path, doc).await
    }
    async fn set_merge(&self, path: &str, fields: Document) -> Result<(), StoreError> {
        self.spend()?;
        self.inner.set_merge(path, fields).await
    }
    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.spend()?;
        self.inner.delete(path).await
    }
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(path).await
    }
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        self.inner.list(collection).await
    }
    fn changes(&self) -> broadcast::Receiver<Change> {
        self.inner.changes()
    }
}
