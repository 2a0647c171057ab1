//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::llm::ProficiencyLevel;

// ---------------------------------------------------------------------------
// InferenceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the generative text/speech API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the API; `/v1beta/models/{model}:generateContent` is appended.
    pub base_url: String,
    /// API key sent as the `key` query parameter.  The binary also reads
    /// `GEMINI_API_KEY`, which takes precedence over this value.
    pub api_key: Option<String>,
    /// Model used for every text prompt.
    pub text_model: String,
    /// Model used for speech synthesis.
    pub speech_model: String,
    /// Prebuilt voice requested from the speech model.
    pub voice_name: String,
    /// Maximum seconds to wait for a single request.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            text_model: "gemini-2.5-flash-preview-09-2025".into(),
            speech_model: "gemini-2.5-flash-preview-tts".into(),
            voice_name: "Kore".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// LearnerConfig
// ---------------------------------------------------------------------------

/// Per-learner defaults applied to every tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Proficiency tier interpolated into every prompt.
    pub level: ProficiencyLevel,
    /// Language being learned, named in prompts.
    pub target_language: String,
    /// Number of words requested by a starter deck.
    pub deck_size: usize,
    /// BCP-47 tag of the on-device voice used when synthesis is unavailable.
    pub local_voice: String,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            level: ProficiencyLevel::A1,
            target_language: "German".into(),
            deck_size: 15,
            local_voice: "de-DE".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Which document store holds the learner's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; nothing survives a restart.
    Memory,
    /// JSON file rewritten after every write.
    File,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::File
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Overrides the document file location; `None` uses [`AppPaths::store_file`].
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolved document file for the `file` backend.
    pub fn resolved_path(&self, paths: &AppPaths) -> PathBuf {
        self.path.clone().unwrap_or_else(|| paths.store_file.clone())
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use german_tutor::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Inference API settings.
    pub inference: InferenceConfig,
    /// Learner defaults.
    pub learner: LearnerConfig,
    /// Persistence backend.
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet so
    /// callers never need to special-case a first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.inference.base_url, loaded.inference.base_url);
        assert_eq!(original.inference.api_key, loaded.inference.api_key);
        assert_eq!(original.inference.text_model, loaded.inference.text_model);
        assert_eq!(original.inference.timeout_secs, loaded.inference.timeout_secs);

        assert_eq!(original.learner.level, loaded.learner.level);
        assert_eq!(original.learner.deck_size, loaded.learner.deck_size);

        assert_eq!(original.store.backend, loaded.store.backend);
        assert_eq!(original.store.path, loaded.store.path);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.learner.level, ProficiencyLevel::A1);
        assert_eq!(config.store.backend, StoreBackend::File);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert!(cfg.inference.api_key.is_none());
        assert_eq!(cfg.inference.voice_name, "Kore");
        assert_eq!(cfg.inference.timeout_secs, 30);
        assert_eq!(cfg.learner.target_language, "German");
        assert_eq!(cfg.learner.deck_size, 15);
        assert_eq!(cfg.learner.local_voice, "de-DE");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.inference.base_url = "http://localhost:8080".into();
        cfg.inference.api_key = Some("test-key".into());
        cfg.learner.level = ProficiencyLevel::C1;
        cfg.learner.deck_size = 5;
        cfg.store.backend = StoreBackend::Memory;
        cfg.store.path = Some(dir.path().join("docs.json"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.inference.base_url, "http://localhost:8080");
        assert_eq!(loaded.inference.api_key.as_deref(), Some("test-key"));
        assert_eq!(loaded.learner.level, ProficiencyLevel::C1);
        assert_eq!(loaded.learner.deck_size, 5);
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
        assert_eq!(loaded.store.path, Some(dir.path().join("docs.json")));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[learner]\nlevel = \"B2\"\n").expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.learner.level, ProficiencyLevel::B2);
        assert_eq!(cfg.learner.deck_size, 15);
        assert_eq!(cfg.inference.voice_name, "Kore");
    }

    #[test]
    fn store_path_override_wins() {
        let paths = AppPaths::new();
        let mut store = StoreConfig::default();
        assert_eq!(store.resolved_path(&paths), paths.store_file);

        store.path = Some(PathBuf::from("/tmp/elsewhere.json"));
        assert_eq!(store.resolved_path(&paths), PathBuf::from("/tmp/elsewhere.json"));
    }
}
