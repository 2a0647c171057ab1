//! Content pipeline for the learning tools.
//!
//! Every tool follows the same path and awards experience only once the
//! whole path has succeeded:
//!
//! ```text
//! ToolRequest
//!        │
//!        ▼
//! ContentPipeline::run()
//!        │
//!        ├─ PromptCatalog        → prompt text (level-aware)
//!        ├─ InferenceBackend     → raw reply (one request, no retry)
//!        ├─ parser + decoders    → typed result   (MalformedResponse / Decode)
//!        ├─ VocabularyStore      → persist        (analysis, deck, review)
//!        └─ Reward               → experience
//!
//! ToolSlot<ToolOutput> ◀── complete(ticket, result)   stale tickets dropped
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use german_tutor::config::AppConfig;
//! use german_tutor::llm::GeminiClient;
//! use german_tutor::pipeline::{ContentPipeline, ToolRequest, ToolSlot};
//! use german_tutor::store::{Identity, MemoryDocumentStore, VocabularyStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let backend = Arc::new(GeminiClient::from_config(&config.inference));
//!     let store = VocabularyStore::open(
//!         Arc::new(MemoryDocumentStore::new()),
//!         &Identity::Token("learner".into()),
//!     )
//!     .await?;
//!     let pipeline = ContentPipeline::from_config(backend, Arc::new(store), &config.learner);
//!
//!     let mut slot = ToolSlot::new();
//!     let ticket = slot.begin();
//!     let result = pipeline
//!         .run(ToolRequest::Analyze("Handschuh".into()), config.learner.level)
//!         .await;
//!     slot.complete(ticket, result);
//!     Ok(())
//! }
//! ```

pub mod content;
pub mod exercises;
pub mod practice;
pub mod rewards;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use content::{ContentPipeline, PipelineError, ToolOutput, ToolRequest, WordAnalysis};
pub use exercises::SentenceBuilder;
pub use practice::DictationOutcome;
pub use rewards::Reward;
pub use state::{Ticket, ToolSlot, ToolState, FAILURE_MESSAGE};
