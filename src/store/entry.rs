//! Vocabulary entries and the experience counter.
//!
//! Field names serialise in camelCase so documents written by the web client
//! and exported JSON files stay interchangeable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grammar / example sentence
// ---------------------------------------------------------------------------

/// Inflection tables for one word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grammar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    /// Grammatical case → `[singular, plural]`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub declension: BTreeMap<String, [String; 2]>,
    /// Tense → six person forms (ich, du, er/sie/es, wir, ihr, sie/Sie).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conjugation: BTreeMap<String, Vec<String>>,
}

impl Grammar {
    pub fn is_empty(&self) -> bool {
        self.plural.is_none() && self.declension.is_empty() && self.conjugation.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleSentence {
    /// Sentence in the target language.
    #[serde(alias = "german")]
    pub text: String,
    pub translation: String,
}

// ---------------------------------------------------------------------------
// VocabularyEntry
// ---------------------------------------------------------------------------

/// A learned lexical item.
///
/// `id` and `word` are always present on persisted entries.  `next_review` is
/// set at creation; an absent value (legacy or hand-edited data) counts as
/// due immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: String,
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<Grammar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<ExampleSentence>,
    /// Milliseconds since the Unix epoch at which the entry becomes due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<i64>,
    /// Milliseconds since the Unix epoch of the last review; 0 = never.
    #[serde(default)]
    pub last_reviewed: i64,
}

impl VocabularyEntry {
    /// A bare entry for `word`, due at `now_ms`, with a fresh id.
    pub fn new(word: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: new_entry_id(),
            word: word.into(),
            gender: None,
            translation: None,
            definition: None,
            ipa: None,
            part_of_speech: None,
            grammar: None,
            example_sentence: None,
            next_review: Some(now_ms),
            last_reviewed: 0,
        }
    }

    /// Due when `next_review` is absent or not after `now_ms`.
    pub fn is_due(&self, now_ms: i64) -> bool {
        self.next_review.map_or(true, |due| due <= now_ms)
    }

    /// Case-insensitive comparison on the base form.
    pub fn same_word(&self, word: &str) -> bool {
        self.word.trim().to_lowercase() == word.trim().to_lowercase()
    }

    /// Enforce the persistence invariants: non-empty `id` and `word`.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("entry has an empty id".into());
        }
        if self.word.trim().is_empty() {
            return Err(format!("entry {} has an empty word", self.id));
        }
        Ok(())
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Mint an opaque unique entry id.
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Experience
// ---------------------------------------------------------------------------

/// Points needed per progression level.
pub const XP_PER_LEVEL: u64 = 100;

/// Progression level derived from cumulative experience: `xp / 100 + 1`.
///
/// ```
/// use german_tutor::store::level_for;
///
/// assert_eq!(level_for(0), 1);
/// assert_eq!(level_for(99), 1);
/// assert_eq!(level_for(250), 3);
/// ```
pub fn level_for(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// Points earned inside the current level (0..100).
pub fn level_progress(xp: u64) -> u64 {
    xp % XP_PER_LEVEL
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
