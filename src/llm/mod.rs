//! Generative-model access for the tutor.
//!
//! This module provides:
//! * [`InferenceBackend`] — async trait implemented by every text/speech backend.
//! * [`GeminiClient`] — `generateContent` REST client (text and speech).
//! * [`parser`] — tolerant JSON extraction from raw model output.
//! * [`PromptCatalog`] / [`ProficiencyLevel`] — one prompt per learning tool.
//! * [`results`] — typed, validating decoders for structured replies.
//! * [`Conversation`] / [`RoleplayReply`] — roleplay history and reply parsing.
//! * [`Speaker`] / [`AudioAsset`] — speech with local-voice fallback.
//! * [`LlmError`] — error variants for inference operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use german_tutor::config::AppConfig;
//! use german_tutor::llm::{decode, AnalysisResult, GeminiClient, InferenceBackend, PromptCatalog};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = GeminiClient::from_config(&config.inference);
//!     let prompt = PromptCatalog::default().analyze_word("Häuser", config.learner.level);
//!
//!     let value = client.generate_json(&prompt).await.unwrap();
//!     let analysis: AnalysisResult = decode(value).unwrap();
//!     println!("{}", analysis.word);
//! }
//! ```

pub mod audio;
pub mod client;
pub mod context;
pub mod parser;
pub mod prompt;
pub mod results;
pub mod speech;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use audio::AudioAsset;
pub use client::{GeminiClient, InferenceBackend, LlmError, JSON_ONLY_SUFFIX};
pub use context::{ChatMessage, ChatRole, Conversation, RoleplayReply};
pub use prompt::{ProficiencyLevel, PromptCatalog};
pub use results::{
    decode, decode_list, AnalysisResult, CorrectionResult, DeckItem, DeconstructionResult,
    DictationSentence, GenderQuizCard, GlossResult, GrammarError, Idiom, SentenceGame, ToolResult,
    WordPart,
};
pub use speech::{Speaker, Utterance};
