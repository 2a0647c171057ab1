//! Document store abstraction and its two backends.
//!
//! Documents are JSON objects addressed by slash-separated paths with an even
//! number of segments (`users/{uid}/vocab/{id}`); a collection path is the
//! document path minus its last segment.  Every successful write is published
//! on a broadcast change feed so listeners can refresh.
//!
//! * [`MemoryDocumentStore`] — process-local, used by tests and the `memory`
//!   backend.
//! * [`FileDocumentStore`] — same semantics, rewritten to a JSON file after
//!   every write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

const CHANGE_FEED_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or could not complete a read or write.
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// An import file did not parse as a vocabulary export.
    #[error("import file is not a valid vocabulary export: {0}")]
    ImportFormatInvalid(String),

    /// No entry with this id exists in the partition.
    #[error("no entry with id {0}")]
    NotFound(String),

    /// An entry failed the persistence invariants.
    #[error("refusing to store invalid entry: {0}")]
    InvalidEntry(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::PersistenceUnavailable(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Delete,
}

/// One committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

// ---------------------------------------------------------------------------
// DocumentStore trait
// ---------------------------------------------------------------------------

/// Async interface to a document database.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn DocumentStore>`.  Writes are last-write-wins; there are no
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `path`.
    async fn set(&self, path: &str, doc: Document) -> Result<(), StoreError>;

    /// Merge `fields` into the document at `path`, creating it if absent.
    /// Nested objects merge recursively; fields not named are preserved.
    async fn set_merge(&self, path: &str, fields: Document) -> Result<(), StoreError>;

    /// Remove the document at `path`.  Removing a missing document succeeds.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Every document directly inside `collection`, as `(id, document)`.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;

    /// Subscribe to committed writes.
    fn changes(&self) -> broadcast::Receiver<Change>;
}

// ---------------------------------------------------------------------------
// Shared document map
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Documents {
    docs: BTreeMap<String, Document>,
}

impl Documents {
    fn set(&mut self, path: &str, doc: Document) {
        self.docs.insert(path.to_string(), doc);
    }

    fn merge(&mut self, path: &str, fields: Document) {
        let target = self.docs.entry(path.to_string()).or_default();
        merge_into(target, fields);
    }

    fn delete(&mut self, path: &str) {
        self.docs.remove(path);
    }

    fn get(&self, path: &str) -> Option<Document> {
        self.docs.get(path).cloned()
    }

    fn list(&self, collection: &str) -> Vec<(String, Document)> {
        let prefix = format!("{}/", collection.trim_end_matches('/'));
        self.docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, doc)| {
                let id = &path[prefix.len()..];
                (!id.contains('/')).then(|| (id.to_string(), doc.clone()))
            })
            .collect()
    }
}

/// Recursive object merge; non-object values replace.
fn merge_into(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        let value = match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
                continue;
            }
            (_, value) => value,
        };
        target.insert(key, value);
    }
}

fn check_path(path: &str) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::PersistenceUnavailable(format!(
            "invalid document path {path:?}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryDocumentStore
// ---------------------------------------------------------------------------

pub struct MemoryDocumentStore {
    inner: RwLock<Documents>,
    feed: broadcast::Sender<Change>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: RwLock::new(Documents::default()),
            feed,
        }
    }

    fn publish(&self, path: &str, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.feed.send(Change {
            path: path.to_string(),
            kind,
        });
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, path: &str, doc: Document) -> Result<(), StoreError> {
        check_path(path)?;
        self.inner.write().await.set(path, doc);
        self.publish(path, ChangeKind::Set);
        Ok(())
    }

    async fn set_merge(&self, path: &str, fields: Document) -> Result<(), StoreError> {
        check_path(path)?;
        self.inner.write().await.merge(path, fields);
        self.publish(path, ChangeKind::Set);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        check_path(path)?;
        self.inner.write().await.delete(path);
        self.publish(path, ChangeKind::Delete);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.get(path))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self.inner.read().await.list(collection))
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.feed.subscribe()
    }
}

// ---------------------------------------------------------------------------
// FileDocumentStore
// ---------------------------------------------------------------------------

/// Document store persisted as one pretty-printed JSON object keyed by path.
///
/// A write is only applied in memory once the file has been rewritten, so a
/// failed save leaves both copies unchanged.
pub struct FileDocumentStore {
    path: PathBuf,
    inner: RwLock<Documents>,
    feed: broadcast::Sender<Change>,
}

impl FileDocumentStore {
    /// Open the store at `path`.  A missing file starts empty; an unreadable
    /// or corrupt file is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let docs = match tokio::fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str::<BTreeMap<String, Document>>(&data).map_err(|e| {
                StoreError::PersistenceUnavailable(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("file store: loaded {} documents from {}", docs.len(), path.display());

        let (feed, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self {
            path,
            inner: RwLock::new(Documents { docs }),
            feed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `edit` to a copy, persist it, then commit.
    async fn write_with(
        &self,
        path: &str,
        kind: ChangeKind,
        edit: impl FnOnce(&mut Documents),
    ) -> Result<(), StoreError> {
        check_path(path)?;
        let mut guard = self.inner.write().await;
        let mut next = Documents {
            docs: guard.docs.clone(),
        };
        edit(&mut next);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(&next.docs)
            .map_err(|e| StoreError::PersistenceUnavailable(e.to_string()))?;
        tokio::fs::write(&self.path, data).await?;

        *guard = next;
        drop(guard);

        let _ = self.feed.send(Change {
            path: path.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn set(&self, path: &str, doc: Document) -> Result<(), StoreError> {
        self.write_with(path, ChangeKind::Set, |docs| docs.set(path, doc))
            .await
    }

    async fn set_merge(&self, path: &str, fields: Document) -> Result<(), StoreError> {
        self.write_with(path, ChangeKind::Set, |docs| docs.merge(path, fields))
            .await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.write_with(path, ChangeKind::Delete, |docs| docs.delete(path))
            .await
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.get(path))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self.inner.read().await.list(collection))
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.feed.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn merge_preserves_unnamed_fields() {
        let store = MemoryDocumentStore::new();
        store
            .set_merge("users/u/vocab/1", doc(json!({"word": "Haus", "ipa": "haʊ̯s"})))
            .await
            .unwrap();
        store
            .set_merge("users/u/vocab/1", doc(json!({"word": "Haus", "nextReview": 5})))
            .await
            .unwrap();

        let stored = store.get("users/u/vocab/1").await.unwrap().unwrap();
        assert_eq!(stored["ipa"], "haʊ̯s");
        assert_eq!(stored["nextReview"], 5);
    }

    #[tokio::test]
    async fn merge_recurses_into_objects() {
        let store = MemoryDocumentStore::new();
        let path = "users/u/vocab/1";
        store
            .set_merge(path, doc(json!({"grammar": {"plural": "Häuser"}})))
            .await
            .unwrap();
        store
            .set_merge(path, doc(json!({"grammar": {"declension": {}}})))
            .await
            .unwrap();
        let stored = store.get(path).await.unwrap().unwrap();
        assert_eq!(stored["grammar"]["plural"], "Häuser");
    }

    #[tokio::test]
    async fn set_replaces_whole_document() {
        let store = MemoryDocumentStore::new();
        let path = "users/u/stats/main";
        store.set(path, doc(json!({"xp": 5, "old": true}))).await.unwrap();
        store.set(path, doc(json!({"xp": 6}))).await.unwrap();
        assert_eq!(
            store.get(path).await.unwrap().unwrap(),
            doc(json!({"xp": 6}))
        );
    }

    #[tokio::test]
    async fn list_only_returns_direct_children() {
        let store = MemoryDocumentStore::new();
        for path in [
            "users/u/vocab/a",
            "users/u/vocab/b",
            "users/u/stats/main",
            "users/other/vocab/c",
            "users/u/vocabulary/x",
        ] {
            store.set(path, doc(json!({}))).await.unwrap();
        }
        let ids: Vec<String> = store
            .list("users/u/vocab")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn rejects_collection_paths_for_documents() {
        let store = MemoryDocumentStore::new();
        let err = store.set("users/u/vocab", Document::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::PersistenceUnavailable(_)));
    }

    #[tokio::test]
    async fn writes_are_published() {
        let store = MemoryDocumentStore::new();
        let mut feed = store.changes();
        store.set("users/u/vocab/a", Document::new()).await.unwrap();
        store.delete("users/u/vocab/a").await.unwrap();

        assert_eq!(feed.recv().await.unwrap().kind, ChangeKind::Set);
        let change = feed.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert_eq!(change.path, "users/u/vocab/a");
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("docs.json");

        let store = FileDocumentStore::open(&path).await.unwrap();
        store
            .set_merge("users/u/vocab/1", doc(json!({"word": "Baum"})))
            .await
            .unwrap();
        store.set("users/u/vocab/2", doc(json!({"word": "Ast"}))).await.unwrap();
        store.delete("users/u/vocab/2").await.unwrap();
        drop(store);

        let reopened = FileDocumentStore::open(&path).await.unwrap();
        let listed = reopened.list("users/u/vocab").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].1["word"], "Baum");
    }

    #[tokio::test]
    async fn file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(store.list("users/u/vocab").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileDocumentStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::PersistenceUnavailable(_)));
    }

    #[tokio::test]
    async fn file_store_failed_write_is_not_applied() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("docs.json");
        std::fs::create_dir(&path).unwrap();
        let store = FileDocumentStore {
            path: path.clone(),
            inner: RwLock::new(Documents::default()),
            feed: broadcast::channel(4).0,
        };

        let err = store
            .set("users/u/vocab/1", doc(json!({"word": "Baum"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PersistenceUnavailable(_)));
        assert!(store.get("users/u/vocab/1").await.unwrap().is_none());
    }
}
