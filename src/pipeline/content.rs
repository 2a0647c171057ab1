//! Prompt → inference → parse → decode → persist, for every content tool.
//!
//! [`ContentPipeline`] is built once at startup from an injected
//! [`InferenceBackend`] and [`VocabularyStore`].  Each operation issues one
//! request; nothing is retried.  Structured replies are decoded with the
//! typed decoders in [`crate::llm::results`] before anything reaches the
//! store, and experience is awarded only after the action succeeds.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use super::exercises::{clean_token, SentenceBuilder};
use super::rewards::Reward;
use super::state::FAILURE_MESSAGE;
use crate::config::LearnerConfig;
use crate::llm::{
    decode, decode_list, AnalysisResult, CorrectionResult, DeckItem, DeconstructionResult,
    DictationSentence, GenderQuizCard, GlossResult, Idiom, InferenceBackend, LlmError,
    ProficiencyLevel, PromptCatalog,
};
use crate::store::{now_ms, StoreError, VocabularyEntry, VocabularyStore};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface from a pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Inference(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blank input; no request was sent.
    #[error("nothing to look up")]
    EmptyInput,
}

impl PipelineError {
    /// What a tool screen shows, whatever went wrong.
    pub fn user_message(&self) -> &'static str {
        FAILURE_MESSAGE
    }
}

// ---------------------------------------------------------------------------
// Requests / outputs
// ---------------------------------------------------------------------------

/// A finished word analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct WordAnalysis {
    /// The stored entry (id reused when the word was already known).
    pub entry: VocabularyEntry,
    /// What the learner typed, when the model corrected it to `entry.word`.
    pub corrected_from: Option<String>,
}

/// One request to a content tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Analyze(String),
    Deconstruct(String),
    Simplify(String),
    Gloss(String),
    Correct(String),
    Idiom,
    Deck(String),
    SentenceGame,
    Dictation,
    GenderQuiz,
}

/// One finished tool result, tagged by the tool that produced it.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Analysis(WordAnalysis),
    Deconstruction(DeconstructionResult),
    Simplified(String),
    Gloss(GlossResult),
    Correction(CorrectionResult),
    Idiom(Idiom),
    Deck(Vec<VocabularyEntry>),
    SentenceGame(SentenceBuilder),
    Dictation(DictationSentence),
    GenderQuiz(GenderQuizCard),
}

// ---------------------------------------------------------------------------
// ContentPipeline
// ---------------------------------------------------------------------------

pub struct ContentPipeline {
    pub(super) backend: Arc<dyn InferenceBackend>,
    pub(super) store: Arc<VocabularyStore>,
    pub(super) prompts: PromptCatalog,
    deck_size: usize,
}

impl ContentPipeline {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        store: Arc<VocabularyStore>,
        prompts: PromptCatalog,
    ) -> Self {
        Self {
            backend,
            store,
            prompts,
            deck_size: 15,
        }
    }

    /// Build with the learner's target language and deck size.
    pub fn from_config(
        backend: Arc<dyn InferenceBackend>,
        store: Arc<VocabularyStore>,
        learner: &LearnerConfig,
    ) -> Self {
        Self::new(backend, store, PromptCatalog::new(&learner.target_language))
            .with_deck_size(learner.deck_size)
    }

    pub fn with_deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size.max(1);
        self
    }

    pub fn store(&self) -> &VocabularyStore {
        &self.store
    }

    /// Add a reward to the learner's experience; returns the new total.
    pub async fn reward(&self, reward: Reward) -> Result<u64, PipelineError> {
        let points = reward.points();
        if points == 0 {
            return Ok(self.store.snapshot().experience);
        }
        Ok(self.store.award_experience(points).await?)
    }

    /// Analyze `term`, store the result and award experience.
    ///
    /// The entry is matched case-insensitively against the collection by its
    /// base form, so analyzing a known word updates it in place (same id).
    pub async fn analyze_word(
        &self,
        term: &str,
        level: ProficiencyLevel,
    ) -> Result<WordAnalysis, PipelineError> {
        let term = non_blank(term)?;
        let value = self
            .backend
            .generate_json(&self.prompts.analyze_word(term, level))
            .await?;
        let analysis: AnalysisResult = decode(value)?;

        let corrected_from = analysis
            .was_corrected
            .then(|| analysis.original_input.clone().unwrap_or_else(|| term.to_string()));

        let mut entry = analysis.into_entry(now_ms());
        if let Some(existing) = self.store.snapshot().find_word(&entry.word) {
            log::debug!("\"{}\" already stored as {}", entry.word, existing.id);
            entry.id = existing.id.clone();
        }

        self.store.upsert(&entry).await?;
        self.reward(Reward::Analysis).await?;
        log::info!("analyzed \"{}\" ({})", entry.word, entry.id);

        Ok(WordAnalysis {
            entry,
            corrected_from,
        })
    }

    /// Generate a starter deck for `topic` and store every item.
    ///
    /// All writes are dispatched at once.  A failed write does not undo the
    /// others; the first error is returned after every write has settled.
    pub async fn bulk_import(
        &self,
        topic: &str,
        level: ProficiencyLevel,
    ) -> Result<Vec<VocabularyEntry>, PipelineError> {
        let topic = non_blank(topic)?;
        let value = self
            .backend
            .generate_json(&self.prompts.starter_deck(topic, self.deck_size, level))
            .await?;
        let items: Vec<DeckItem> = decode_list(value)?;

        let now = now_ms();
        let known = self.store.snapshot();
        let entries: Vec<VocabularyEntry> = items
            .into_iter()
            .map(|item| {
                let mut entry = item.into_entry(now);
                if let Some(existing) = known.find_word(&entry.word) {
                    entry.id = existing.id.clone();
                }
                entry
            })
            .collect();

        let results = join_all(entries.iter().map(|entry| self.store.upsert(entry))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if let Some(err) = results.into_iter().find_map(Result::err) {
            log::error!("{failed} of {} deck writes failed: {err}", entries.len());
            return Err(err.into());
        }

        log::info!("imported {} words for \"{topic}\"", entries.len());
        Ok(entries)
    }

    /// Split a compound word into its parts.  Not stored.
    pub async fn deconstruct(
        &self,
        word: &str,
        level: ProficiencyLevel,
    ) -> Result<DeconstructionResult, PipelineError> {
        let word = non_blank(word)?;
        let value = self
            .backend
            .generate_json(&self.prompts.deconstruct(word, level))
            .await?;
        let result: DeconstructionResult = decode(value)?;
        self.reward(Reward::Deconstruction).await?;
        Ok(result)
    }

    /// Correct a piece of writing with per-error explanations.  Not stored.
    pub async fn correct_text(
        &self,
        text: &str,
        level: ProficiencyLevel,
    ) -> Result<CorrectionResult, PipelineError> {
        let text = non_blank(text)?;
        let value = self
            .backend
            .generate_json(&self.prompts.correct_text(text, level))
            .await?;
        let result: CorrectionResult = decode(value)?;
        self.reward(Reward::GrammarCorrection).await?;
        Ok(result)
    }

    /// Rewrite `text` at `level`.  Free text.
    pub async fn simplify(
        &self,
        text: &str,
        level: ProficiencyLevel,
    ) -> Result<String, PipelineError> {
        let text = non_blank(text)?;
        let reply = self
            .backend
            .generate_text(&self.prompts.simplify(text, level))
            .await?;
        Ok(reply.trim().to_string())
    }

    /// Brief lookup of a token clicked in a reading passage.  Tokens of one
    /// character or less after punctuation is stripped are ignored.
    pub async fn gloss(
        &self,
        token: &str,
        level: ProficiencyLevel,
    ) -> Result<GlossResult, PipelineError> {
        let word = clean_token(token);
        if word.chars().count() <= 1 {
            return Err(PipelineError::EmptyInput);
        }
        let value = self
            .backend
            .generate_json(&self.prompts.gloss(&word, level))
            .await?;
        Ok(decode(value)?)
    }

    /// A popular idiom with its literal and actual meaning.
    pub async fn idiom(&self, level: ProficiencyLevel) -> Result<Idiom, PipelineError> {
        let value = self.backend.generate_json(&self.prompts.idiom(level)).await?;
        let idiom: Idiom = decode(value)?;
        self.reward(Reward::Idiom).await?;
        Ok(idiom)
    }

    /// Run one tool request.
    pub async fn run(
        &self,
        request: ToolRequest,
        level: ProficiencyLevel,
    ) -> Result<ToolOutput, PipelineError> {
        let output = match request {
            ToolRequest::Analyze(term) => ToolOutput::Analysis(self.analyze_word(&term, level).await?),
            ToolRequest::Deconstruct(word) => {
                ToolOutput::Deconstruction(self.deconstruct(&word, level).await?)
            }
            ToolRequest::Simplify(text) => ToolOutput::Simplified(self.simplify(&text, level).await?),
            ToolRequest::Gloss(token) => ToolOutput::Gloss(self.gloss(&token, level).await?),
            ToolRequest::Correct(text) => ToolOutput::Correction(self.correct_text(&text, level).await?),
            ToolRequest::Idiom => ToolOutput::Idiom(self.idiom(level).await?),
            ToolRequest::Deck(topic) => ToolOutput::Deck(self.bulk_import(&topic, level).await?),
            ToolRequest::SentenceGame => ToolOutput::SentenceGame(self.sentence_game(level).await?),
            ToolRequest::Dictation => ToolOutput::Dictation(self.dictation(level).await?),
            ToolRequest::GenderQuiz => ToolOutput::GenderQuiz(self.gender_quiz(level).await?),
        };
        Ok(output)
    }
}

pub(super) fn non_blank(input: &str) -> Result<&str, PipelineError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(PipelineError::EmptyInput)
    } else {
        Ok(trimmed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
