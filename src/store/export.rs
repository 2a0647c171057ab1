//! JSON export/import of the vocabulary collection and the local backup file.
//!
//! An export is a pretty-printed JSON array of entries.  Import validates the
//! whole file before anything is applied: one bad entry rejects the import.
//! The local backup is replaced only after the document store has accepted
//! the imported collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{StoreError, VocabularyEntry, VocabularyStore};

/// Suggested file name for a downloaded export.
pub const EXPORT_FILE_NAME: &str = "german_vocab_backup.json";

/// Serialise `entries` as a pretty JSON array.
pub fn export_json(entries: &[VocabularyEntry]) -> Result<String, StoreError> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| StoreError::PersistenceUnavailable(format!("export failed: {e}")))
}

/// Parse and validate an export.
///
/// Fails with [`StoreError::ImportFormatInvalid`] when the text is not JSON,
/// is not an array, or contains an entry that is malformed, has an empty id
/// or word, or repeats an id.
pub fn import_json(text: &str) -> Result<Vec<VocabularyEntry>, StoreError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::ImportFormatInvalid(format!("not JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(StoreError::ImportFormatInvalid(
            "expected an array of entries".into(),
        ));
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let entry: VocabularyEntry = serde_json::from_value(item)
            .map_err(|e| StoreError::ImportFormatInvalid(format!("entry {index}: {e}")))?;
        entry
            .validate()
            .map_err(|e| StoreError::ImportFormatInvalid(format!("entry {index}: {e}")))?;
        if !seen.insert(entry.id.clone()) {
            return Err(StoreError::ImportFormatInvalid(format!(
                "entry {index}: duplicate id {}",
                entry.id
            )));
        }
        entries.push(entry);
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// LocalCache
// ---------------------------------------------------------------------------

/// On-disk copy of the collection kept alongside the document store.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the cache with `entries`.
    pub fn write(&self, entries: &[VocabularyEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, export_json(entries)?)?;
        Ok(())
    }

}

/// Replace the learner's collection with the export in `text`.
///
/// The file is validated first, then written to the store, and the local
/// backup is rewritten last.  Any failure leaves the backup untouched.
/// Returns the imported entries.
pub async fn import_collection(
    text: &str,
    store: &VocabularyStore,
    cache: &LocalCache,
) -> Result<Vec<VocabularyEntry>, StoreError> {
    let entries = import_json(text)?;
    store.replace_all(&entries).await?;
    cache.write(&entries)?;
    log::info!(
        "imported {} entries; backup at {}",
        entries.len(),
        cache.path().display()
    );
    Ok(entries)
}
