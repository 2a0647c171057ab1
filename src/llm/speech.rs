//! Speech output with on-device fallback.
//!
//! [`Speaker`] wraps any [`InferenceBackend`] and never fails: when the
//! remote synthesizer is unavailable it returns [`Utterance::LocalVoice`] so
//! the caller hands the text to the platform speech synthesizer instead.

use std::sync::Arc;

use crate::llm::audio::AudioAsset;
use crate::llm::client::InferenceBackend;

/// What the caller should play.
#[derive(Debug, Clone, PartialEq)]
pub enum Utterance {
    /// Remote synthesis succeeded.
    Generated(AudioAsset),
    /// Speak `text` with the local voice identified by `voice` (a BCP-47 tag
    /// such as `"de-DE"`).
    LocalVoice { text: String, voice: String },
}

impl Utterance {
    /// `true` when remote audio was produced.
    pub fn is_generated(&self) -> bool {
        matches!(self, Utterance::Generated(_))
    }
}

/// Speech front end shared by every tool that reads text aloud.
pub struct Speaker {
    backend: Arc<dyn InferenceBackend>,
    local_voice: String,
}

impl Speaker {
    pub fn new(backend: Arc<dyn InferenceBackend>, local_voice: impl Into<String>) -> Self {
        Self {
            backend,
            local_voice: local_voice.into(),
        }
    }

    /// Synthesize `text`, falling back to the local voice on any failure.
    ///
    /// Blank input never reaches the backend.
    pub async fn speak(&self, text: &str) -> Utterance {
        let text = text.trim();
        if !text.is_empty() {
            if let Some(asset) = self.backend.generate_speech(text).await {
                return Utterance::Generated(asset);
            }
        }
        Utterance::LocalVoice {
            text: text.to_string(),
            voice: self.local_voice.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysOk {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceBackend for AlwaysOk {
        async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(String::new())
        }

        async fn synthesize(&self, _text: &str) -> Result<AudioAsset, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AudioAsset::from_pcm(&[0; 8], 24_000)
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl InferenceBackend for AlwaysFails {
        async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Timeout)
        }

        async fn synthesize(&self, _text: &str) -> Result<AudioAsset, LlmError> {
            Err(LlmError::SpeechSynthesisUnavailable("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn passes_through_generated_audio() {
        let speaker = Speaker::new(Arc::new(AlwaysOk { calls: AtomicUsize::new(0) }), "de-DE");
        let utterance = speaker.speak("Guten Morgen").await;
        assert!(utterance.is_generated());
    }

    #[tokio::test]
    async fn falls_back_to_local_voice_on_failure() {
        let speaker = Speaker::new(Arc::new(AlwaysFails), "de-DE");
        let utterance = speaker.speak("Guten Morgen").await;
        assert_eq!(
            utterance,
            Utterance::LocalVoice {
                text: "Guten Morgen".into(),
                voice: "de-DE".into()
            }
        );
    }

    #[tokio::test]
    async fn blank_text_skips_the_backend() {
        let backend = Arc::new(AlwaysOk { calls: AtomicUsize::new(0) });
        let speaker = Speaker::new(backend.clone(), "de-DE");
        let utterance = speaker.speak("   ").await;
        assert!(!utterance.is_generated());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
