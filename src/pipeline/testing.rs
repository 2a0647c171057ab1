//! Test doubles shared by the pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ContentPipeline;
use crate::llm::{AudioAsset, InferenceBackend, LlmError, PromptCatalog};
use crate::store::testing::FailingWrites;
use crate::store::{DocumentStore, Identity, MemoryDocumentStore, VocabularyStore};

/// Replies with a fixed script, one reply per text request, and records
/// every prompt it receives.
pub struct Scripted {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for Scripted {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InferenceUnavailable("script exhausted".into())))
    }

    async fn synthesize(&self, _text: &str) -> Result<AudioAsset, LlmError> {
        Err(LlmError::SpeechSynthesisUnavailable("not scripted".into()))
    }
}

async fn build(
    backend: Arc<dyn DocumentStore>,
    replies: Vec<Result<String, LlmError>>,
) -> (ContentPipeline, Arc<Scripted>) {
    let inference = Arc::new(Scripted::new(replies));
    let store = VocabularyStore::open(backend, &Identity::Token("tester".into()))
        .await
        .unwrap();
    let pipeline = ContentPipeline::new(
        inference.clone(),
        Arc::new(store),
        PromptCatalog::default(),
    );
    (pipeline, inference)
}

/// A pipeline over an empty in-memory store.
pub async fn pipeline_with(
    replies: Vec<Result<String, LlmError>>,
) -> (ContentPipeline, Arc<Scripted>) {
    build(Arc::new(MemoryDocumentStore::new()), replies).await
}

/// A pipeline whose store rejects every write.
pub async fn failing_pipeline(replies: Vec<Result<String, LlmError>>) -> ContentPipeline {
    build(Arc::new(FailingWrites::offline()), replies).await.0
}
