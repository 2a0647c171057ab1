//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + identity):
//!   Windows: %APPDATA%\german-tutor\
//!   macOS:   ~/Library/Application Support/german-tutor/
//!   Linux:   ~/.config/german-tutor/
//!
//! Data dir (document store + export backup):
//!   Windows: %LOCALAPPDATA%\german-tutor\
//!   macOS:   ~/Library/Application Support/german-tutor/
//!   Linux:   ~/.local/share/german-tutor/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `identity`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Anonymous identity, one UUID per line.
    pub identity_file: PathBuf,
    /// Directory for learner data.
    pub data_dir: PathBuf,
    /// JSON document store used by the `file` backend.
    pub store_file: PathBuf,
    /// Local vocabulary backup, replaced wholesale on import.
    pub local_cache_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "german-tutor";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::rooted(config_dir, data_dir)
    }

    /// Lay out the files under explicit directories.
    pub fn rooted(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            settings_file: config_dir.join("settings.toml"),
            identity_file: config_dir.join("identity"),
            store_file: data_dir.join("documents.json"),
            local_cache_file: data_dir.join("vocab-backup.json"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.data_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .store_file
            .file_name()
            .is_some_and(|n| n == "documents.json"));
    }

    #[test]
    fn rooted_layout() {
        let paths = AppPaths::rooted("/c".into(), "/d".into());
        assert_eq!(paths.identity_file, PathBuf::from("/c/identity"));
        assert_eq!(paths.local_cache_file, PathBuf::from("/d/vocab-backup.json"));
    }
}
