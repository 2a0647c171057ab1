//! Configuration module for the tutor.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for inference,
//! learner defaults and persistence, `AppPaths` for cross-platform data
//! directories, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, InferenceConfig, LearnerConfig, StoreBackend, StoreConfig};
