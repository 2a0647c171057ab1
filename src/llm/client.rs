//! Core `InferenceBackend` trait and the `GeminiClient` implementation.
//!
//! `GeminiClient` calls a `generateContent`-style endpoint for both text and
//! speech.  All connection details come from [`InferenceConfig`]; nothing is
//! hardcoded.  There is no retry: one failed attempt surfaces immediately.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::InferenceConfig;
use crate::llm::audio::AudioAsset;
use crate::llm::parser;

/// Instruction appended to every prompt that expects structured output.
pub const JSON_ONLY_SUFFIX: &str = " \nReturn ONLY valid JSON. No markdown.";

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the inference API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The model's text did not contain a decodable JSON object or array.
    #[error("model returned malformed JSON: {0}")]
    MalformedResponse(String),

    /// Transport failure, non-success HTTP status or an unexpected envelope.
    #[error("inference service unavailable: {0}")]
    InferenceUnavailable(String),

    /// The request did not complete within the configured timeout.
    #[error("inference request timed out")]
    Timeout,

    /// Speech synthesis failed; callers fall back to a local voice.
    #[error("speech synthesis unavailable: {0}")]
    SpeechSynthesisUnavailable(String),

    /// The JSON parsed but does not have the shape the tool expects.
    #[error("unexpected {kind} shape: {reason}")]
    Decode { kind: &'static str, reason: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::InferenceUnavailable(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// InferenceBackend trait
// ---------------------------------------------------------------------------

/// Async interface to a generative text/speech service.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn InferenceBackend>` between the content pipeline and the CLI.
/// Only [`generate_text`](Self::generate_text) and
/// [`synthesize`](Self::synthesize) are required; the JSON and speech helpers
/// are layered on top.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send `prompt` and return the model's raw text.
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;

    /// Synthesize `text` into a playable WAV asset.
    async fn synthesize(&self, text: &str) -> Result<AudioAsset, LlmError>;

    /// Ask for raw JSON and extract it with the tolerant parser.
    async fn generate_json(&self, prompt: &str) -> Result<Value, LlmError> {
        let prompt = format!("{prompt}{JSON_ONLY_SUFFIX}");
        let text = self.generate_text(&prompt).await?;
        parser::parse(&text)
    }

    /// Like [`synthesize`](Self::synthesize) but never fails: `None` tells
    /// the caller to use an on-device voice instead.
    async fn generate_speech(&self, text: &str) -> Option<AudioAsset> {
        match self.synthesize(text).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("speech synthesis failed, falling back to local voice: {e}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

/// Pull `candidates[0].content.parts[0].text` out of a response envelope.
pub fn extract_text(envelope: &Value) -> Result<String, LlmError> {
    envelope["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::InferenceUnavailable("response has no candidate text".into()))
}

/// Pull `candidates[0].content.parts[0].inlineData` out of a speech envelope
/// and wrap it as a WAV asset.
pub fn extract_audio(envelope: &Value) -> Result<AudioAsset, LlmError> {
    let inline = &envelope["candidates"][0]["content"]["parts"][0]["inlineData"];
    let data = inline["data"]
        .as_str()
        .ok_or_else(|| LlmError::SpeechSynthesisUnavailable("response has no audio data".into()))?;
    let mime_type = inline["mimeType"].as_str().unwrap_or_default();
    AudioAsset::from_inline_data(data, mime_type)
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls the `models/{model}:generateContent` endpoint.
///
/// The API key travels as the `key` query parameter and is only attached when
/// it is a non-empty string.
pub struct GeminiClient {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl GeminiClient {
    /// Build a client from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &InferenceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn post(&self, model: &str, body: &Value) -> Result<Value, LlmError> {
        let mut req = self.client.post(self.endpoint(model)).json(body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.query(&[("key", key)]);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::InferenceUnavailable(format!("HTTP {status}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LlmError::InferenceUnavailable(format!("unreadable envelope: {e}")))
    }
}

#[async_trait]
impl InferenceBackend for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let envelope = self.post(&self.config.text_model, &body).await?;
        extract_text(&envelope)
    }

    async fn synthesize(&self, text: &str) -> Result<AudioAsset, LlmError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice_name }
                    }
                }
            }
        });

        let envelope = self
            .post(&self.config.speech_model, &body)
            .await
            .map_err(|e| LlmError::SpeechSynthesisUnavailable(e.to_string()))?;
        extract_audio(&envelope)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
