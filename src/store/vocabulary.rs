//! The learner's vocabulary collection and experience counter.
//!
//! [`VocabularyStore`] is bound to one [`Identity`] and keeps the latest
//! [`Snapshot`] of that partition in a `watch` channel.  The snapshot is
//! refreshed after every write made through the store and, via a background
//! listener on the backend's change feed, after writes made by anyone else.
//! Subscribers receive the current snapshot immediately and then every
//! refresh until they unsubscribe or the identity changes.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

use super::backend::{Change, Document, DocumentStore, StoreError};
use super::entry::{level_for, VocabularyEntry};
use super::identity::Identity;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The full collection plus the experience counter, as last read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<VocabularyEntry>,
    pub experience: u64,
}

impl Snapshot {
    pub fn get(&self, id: &str) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Case-insensitive lookup on the base form.
    pub fn find_word(&self, word: &str) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.same_word(word))
    }

    pub fn level(&self) -> u64 {
        level_for(self.experience)
    }

    pub fn due_count(&self, now_ms: i64) -> usize {
        self.entries.iter().filter(|e| e.is_due(now_ms)).count()
    }

    /// Entries ordered by word, case-insensitively.
    pub fn sorted_by_word(&self) -> Vec<VocabularyEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|e| e.word.to_lowercase());
        entries
    }

    /// Entries whose word or translation contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<VocabularyEntry> {
        let query = query.trim().to_lowercase();
        self.sorted_by_word()
            .into_iter()
            .filter(|e| {
                e.word.to_lowercase().contains(&query)
                    || e
                        .translation
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// The whole collection in random order, for flashcards.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<VocabularyEntry> {
        let mut entries = self.entries.clone();
        entries.shuffle(rng);
        entries
    }
}

// ---------------------------------------------------------------------------
// Shared refresh state
// ---------------------------------------------------------------------------

struct Shared {
    backend: Arc<dyn DocumentStore>,
    identity: Identity,
    snapshot: watch::Sender<Snapshot>,
    /// Serialises load-and-publish so a slow refresh never overwrites a
    /// newer one.
    refresh_lock: Mutex<()>,
}

impl Shared {
    async fn refresh(&self) -> Result<(), StoreError> {
        let _guard = self.refresh_lock.lock().await;
        let snapshot = load_snapshot(self.backend.as_ref(), &self.identity).await?;
        self.snapshot.send_replace(snapshot);
        Ok(())
    }
}

async fn load_snapshot(
    backend: &dyn DocumentStore,
    identity: &Identity,
) -> Result<Snapshot, StoreError> {
    let docs = backend.list(&identity.vocab_collection()).await?;
    let mut entries = Vec::with_capacity(docs.len());
    for (id, mut doc) in docs {
        // The document path is authoritative for the id.
        doc.insert("id".into(), Value::String(id.clone()));
        match serde_json::from_value::<VocabularyEntry>(Value::Object(doc)) {
            Ok(entry) if entry.validate().is_ok() => entries.push(entry),
            Ok(_) => log::warn!("skipping vocabulary document {id} with an empty word"),
            Err(e) => log::warn!("skipping unreadable vocabulary document {id}: {e}"),
        }
    }

    let experience = backend
        .get(&identity.stats_doc())
        .await?
        .and_then(|stats| stats.get("xp").and_then(Value::as_u64))
        .unwrap_or(0);

    Ok(Snapshot {
        entries,
        experience,
    })
}

fn to_document(entry: &VocabularyEntry) -> Result<Document, StoreError> {
    match serde_json::to_value(entry) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(StoreError::InvalidEntry(entry.id.clone())),
        Err(e) => Err(StoreError::InvalidEntry(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle returned by [`VocabularyStore::subscribe`].  Dropping it stops
/// delivery.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// VocabularyStore
// ---------------------------------------------------------------------------

pub struct VocabularyStore {
    shared: Arc<Shared>,
    listener: JoinHandle<()>,
}

impl VocabularyStore {
    /// Bind to `identity`'s partition, load the initial snapshot and start
    /// listening for external changes.  Must be called inside a Tokio runtime.
    pub async fn open(
        backend: Arc<dyn DocumentStore>,
        identity: &Identity,
    ) -> Result<Self, StoreError> {
        // Subscribe before the first load so no write slips between them.
        let feed = backend.changes();
        let initial = load_snapshot(backend.as_ref(), identity).await?;
        log::info!(
            "opened vocabulary for {}: {} entries, {} xp",
            identity.uid(),
            initial.entries.len(),
            initial.experience
        );

        let (snapshot, _) = watch::channel(initial);
        let shared = Arc::new(Shared {
            backend,
            identity: identity.clone(),
            snapshot,
            refresh_lock: Mutex::new(()),
        });
        let listener = spawn_listener(Arc::clone(&shared), feed);

        Ok(Self { shared, listener })
    }

    /// Tear down the current partition's listener and subscribers and bind
    /// to `identity` on the same backend.
    pub async fn switch_identity(&mut self, identity: &Identity) -> Result<(), StoreError> {
        let next = Self::open(Arc::clone(&self.shared.backend), identity).await?;
        *self = next;
        Ok(())
    }

    pub fn identity(&self) -> &Identity {
        &self.shared.identity
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Deliver the current snapshot to `on_change` now, then again after
    /// every refresh.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + 'static,
    {
        let mut rx = self.shared.snapshot.subscribe();
        let initial = rx.borrow_and_update().clone();
        on_change(&initial);

        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                on_change(&snapshot);
            }
        });
        Subscription { task }
    }

    /// Re-read the partition and publish it.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.shared.refresh().await
    }

    /// Merge `entry` into its document.  Absent optional fields leave the
    /// stored values untouched.
    pub async fn upsert(&self, entry: &VocabularyEntry) -> Result<(), StoreError> {
        entry.validate().map_err(StoreError::InvalidEntry)?;
        let doc = to_document(entry)?;
        self.shared
            .backend
            .set_merge(&self.shared.identity.vocab_doc(&entry.id), doc)
            .await?;
        self.refresh().await
    }

    /// Record a review: merge only the schedule fields into an existing
    /// entry.  Fails with [`StoreError::NotFound`] when the entry is gone.
    pub async fn reschedule(
        &self,
        id: &str,
        next_review: i64,
        last_reviewed: i64,
    ) -> Result<(), StoreError> {
        let path = self.shared.identity.vocab_doc(id);
        if self.shared.backend.get(&path).await?.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let mut fields = Document::new();
        fields.insert("nextReview".into(), json!(next_review));
        fields.insert("lastReviewed".into(), json!(last_reviewed));
        self.shared.backend.set_merge(&path, fields).await?;
        self.refresh().await
    }

    /// Remove one entry.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.shared.identity.vocab_doc(id);
        if self.shared.backend.get(&path).await?.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.shared.backend.delete(&path).await?;
        self.refresh().await
    }

    /// Make the collection exactly `entries`: listed ones are overwritten
    /// first, then documents not listed are deleted, so a failed write never
    /// removes anything.
    pub async fn replace_all(&self, entries: &[VocabularyEntry]) -> Result<(), StoreError> {
        let docs = entries
            .iter()
            .map(|entry| {
                entry.validate().map_err(StoreError::InvalidEntry)?;
                Ok((entry.id.as_str(), to_document(entry)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let identity = &self.shared.identity;
        let existing = self.shared.backend.list(&identity.vocab_collection()).await?;
        let written = async {
            for (id, doc) in docs {
                self.shared.backend.set(&identity.vocab_doc(id), doc).await?;
            }
            for (id, _) in existing {
                if !entries.iter().any(|e| e.id == id) {
                    self.shared.backend.delete(&identity.vocab_doc(&id)).await?;
                }
            }
            Ok::<_, StoreError>(())
        }
        .await;

        // Publish whatever landed, even on failure.
        let refreshed = self.refresh().await;
        written?;
        refreshed
    }

    /// Store the experience counter.
    pub async fn set_counter(&self, value: u64) -> Result<(), StoreError> {
        let mut fields = Document::new();
        fields.insert("xp".into(), json!(value));
        self.shared
            .backend
            .set_merge(&self.shared.identity.stats_doc(), fields)
            .await?;
        self.refresh().await
    }

    /// Add `amount` to the counter.  The local snapshot is bumped before the
    /// write is acknowledged; returns the new total.
    pub async fn award_experience(&self, amount: u64) -> Result<u64, StoreError> {
        let mut total = 0;
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.experience += amount;
            total = snapshot.experience;
        });
        log::debug!("+{amount} xp (total {total})");
        self.set_counter(total).await?;
        Ok(total)
    }
}

impl Drop for VocabularyStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn spawn_listener(shared: Arc<Shared>, mut feed: broadcast::Receiver<Change>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let prefix = shared.identity.partition_prefix();
        loop {
            match feed.recv().await {
                Ok(change) if !change.path.starts_with(&prefix) => continue,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("change feed lagged by {skipped}, refreshing");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            if let Err(e) = shared.refresh().await {
                log::warn!("vocabulary refresh failed: {e}");
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
