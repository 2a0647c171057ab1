//! Per-learner persistence.
//!
//! * [`DocumentStore`] — async document database trait, with
//!   [`MemoryDocumentStore`] and [`FileDocumentStore`] backends.
//! * [`Identity`] — anonymous or token sign-in naming the learner's partition.
//! * [`VocabularyStore`] — the collection and experience counter with live
//!   [`Snapshot`] notification.
//! * [`VocabularyEntry`] — the persisted domain record.
//! * [`export`] — JSON export/import and the local backup file.

pub mod backend;
pub mod entry;
pub mod export;
pub mod identity;
#[cfg(test)]
pub(crate) mod testing;
pub mod vocabulary;

pub use backend::{
    Change, ChangeKind, Document, DocumentStore, FileDocumentStore, MemoryDocumentStore,
    StoreError,
};
pub use entry::{
    level_for, level_progress, new_entry_id, now_ms, ExampleSentence, Grammar, VocabularyEntry,
    XP_PER_LEVEL,
};
pub use export::{export_json, import_collection, import_json, LocalCache, EXPORT_FILE_NAME};
pub use identity::Identity;
pub use vocabulary::{Snapshot, Subscription, VocabularyStore};
