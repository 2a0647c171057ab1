//! Typed results for every structured prompt.
//!
//! Each tool has its own record with explicit required/optional fields and a
//! validating decoder.  JSON that parses but has the wrong shape (missing
//! required field, wrong type, empty word, short conjugation row) becomes
//! [`LlmError::Decode`] instead of leaking half-filled values to the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::llm::client::LlmError;
use crate::store::{new_entry_id, ExampleSentence, Grammar, VocabularyEntry};

/// Number of person forms in a conjugation row.
pub const PERSON_FORMS: usize = 6;

/// A record that can be decoded from a parsed model response.
pub trait ToolResult: DeserializeOwned {
    /// Short name used in decode errors and logs.
    const KIND: &'static str;

    /// Checks serde cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Decode and validate `value` as `T`.
pub fn decode<T: ToolResult>(value: Value) -> Result<T, LlmError> {
    let result: T = serde_json::from_value(value).map_err(|e| LlmError::Decode {
        kind: T::KIND,
        reason: e.to_string(),
    })?;
    result.validate().map_err(|reason| LlmError::Decode {
        kind: T::KIND,
        reason,
    })?;
    Ok(result)
}

/// Decode a JSON array element by element.
pub fn decode_list<T: ToolResult>(value: Value) -> Result<Vec<T>, LlmError> {
    match value {
        Value::Array(items) => items.into_iter().map(decode::<T>).collect(),
        other => Err(LlmError::Decode {
            kind: T::KIND,
            reason: format!("expected an array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Treat `null` and blank strings as absent.
fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` is empty"))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Word analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Base form, possibly spelling-corrected.
    pub word: String,
    #[serde(default)]
    pub was_corrected: bool,
    #[serde(default, deserialize_with = "non_blank")]
    pub original_input: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub translation: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub definition: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub ipa: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub grammar: Option<Grammar>,
    #[serde(default)]
    pub example_sentence: Option<ExampleSentence>,
}

impl ToolResult for AnalysisResult {
    const KIND: &'static str = "word analysis";

    fn validate(&self) -> Result<(), String> {
        require_text("word", &self.word)?;
        if let Some(grammar) = &self.grammar {
            for (tense, forms) in &grammar.conjugation {
                if forms.len() != PERSON_FORMS {
                    return Err(format!(
                        "conjugation `{tense}` has {} forms, expected {PERSON_FORMS}",
                        forms.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

impl AnalysisResult {
    /// Materialise as a new entry due at `now_ms`.
    pub fn into_entry(self, now_ms: i64) -> VocabularyEntry {
        VocabularyEntry {
            id: new_entry_id(),
            word: self.word.trim().to_string(),
            gender: self.gender,
            translation: self.translation,
            definition: self.definition,
            ipa: self.ipa,
            part_of_speech: self.part_of_speech,
            grammar: self.grammar.filter(|g| !g.is_empty()),
            example_sentence: self.example_sentence,
            next_review: Some(now_ms),
            last_reviewed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Compound decomposition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WordPart {
    pub german: String,
    pub english: String,
    #[serde(rename = "type", default, deserialize_with = "non_blank")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeconstructionResult {
    pub parts: Vec<WordPart>,
    pub meaning: String,
}

impl ToolResult for DeconstructionResult {
    const KIND: &'static str = "deconstruction";

    fn validate(&self) -> Result<(), String> {
        if self.parts.is_empty() {
            return Err("no parts".into());
        }
        require_text("meaning", &self.meaning)
    }
}

// ---------------------------------------------------------------------------
// Reader gloss
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlossResult {
    pub word: String,
    #[serde(default, deserialize_with = "non_blank")]
    pub gender: Option<String>,
    pub translation: String,
    #[serde(rename = "type", default, deserialize_with = "non_blank")]
    pub kind: Option<String>,
}

impl ToolResult for GlossResult {
    const KIND: &'static str = "gloss";

    fn validate(&self) -> Result<(), String> {
        require_text("word", &self.word)
    }
}

// ---------------------------------------------------------------------------
// Sentence builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentenceGame {
    pub sentence: String,
    pub translation: String,
    pub parts: Vec<String>,
}

impl ToolResult for SentenceGame {
    const KIND: &'static str = "sentence game";

    fn validate(&self) -> Result<(), String> {
        require_text("sentence", &self.sentence)?;
        if self.parts.is_empty() {
            return Err("no parts to arrange".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Grammar correction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrammarError {
    pub original: String,
    pub correction: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorrectionResult {
    pub corrected: String,
    #[serde(default)]
    pub errors: Vec<GrammarError>,
}

impl ToolResult for CorrectionResult {
    const KIND: &'static str = "grammar correction";

    fn validate(&self) -> Result<(), String> {
        require_text("corrected", &self.corrected)
    }
}

// ---------------------------------------------------------------------------
// Idiom
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Idiom {
    #[serde(rename = "german")]
    pub phrase: String,
    pub literal: String,
    pub meaning: String,
    #[serde(default)]
    pub context: String,
}

impl ToolResult for Idiom {
    const KIND: &'static str = "idiom";

    fn validate(&self) -> Result<(), String> {
        require_text("german", &self.phrase)
    }
}

// ---------------------------------------------------------------------------
// Starter deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckItem {
    pub word: String,
    #[serde(default, deserialize_with = "non_blank")]
    pub translation: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub part_of_speech: Option<String>,
}

impl ToolResult for DeckItem {
    const KIND: &'static str = "deck item";

    fn validate(&self) -> Result<(), String> {
        require_text("word", &self.word)
    }
}

impl DeckItem {
    /// Materialise as a new entry with its own id, due at `now_ms`.
    pub fn into_entry(self, now_ms: i64) -> VocabularyEntry {
        let mut entry = VocabularyEntry::new(self.word.trim(), now_ms);
        entry.translation = self.translation;
        entry.gender = self.gender;
        entry.part_of_speech = self.part_of_speech;
        entry
    }
}

// ---------------------------------------------------------------------------
// Dictation / gender quiz
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DictationSentence {
    pub text: String,
}

impl ToolResult for DictationSentence {
    const KIND: &'static str = "dictation sentence";

    fn validate(&self) -> Result<(), String> {
        require_text("text", &self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenderQuizCard {
    pub word: String,
    pub gender: String,
}

impl ToolResult for GenderQuizCard {
    const KIND: &'static str = "gender quiz";

    fn validate(&self) -> Result<(), String> {
        require_text("word", &self.word)?;
        require_text("gender", &self.gender)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_analysis() -> Value {
        json!({
            "word": "Haus",
            "wasCorrected": true,
            "originalInput": "Hauses",
            "gender": "das",
            "translation": "house",
            "definition": "a building for living in",
            "ipa": "haʊ̯s",
            "partOfSpeech": "noun",
            "grammar": {
                "plural": "Häuser",
                "declension": {
                    "nominative": ["das Haus", "die Häuser"],
                    "genitive": ["des Hauses", "der Häuser"]
                }
            },
            "exampleSentence": {"german": "Das Haus ist alt.", "translation": "The house is old."}
        })
    }

    #[test]
    fn decodes_complete_analysis() {
        let result: AnalysisResult = decode(full_analysis()).unwrap();
        assert_eq!(result.word, "Haus");
        assert!(result.was_corrected);
        assert_eq!(result.original_input.as_deref(), Some("Hauses"));
        let grammar = result.grammar.as_ref().unwrap();
        assert_eq!(grammar.declension["genitive"][0], "des Hauses");
        assert_eq!(
            result.example_sentence.as_ref().unwrap().text,
            "Das Haus ist alt."
        );
    }

    #[test]
    fn analysis_with_only_a_word_is_accepted() {
        let result: AnalysisResult = decode(json!({"word": "und", "gender": null})).unwrap();
        assert!(!result.was_corrected);
        assert_eq!(result.gender, None);
    }

    #[test]
    fn blank_gender_is_treated_as_absent() {
        let result: AnalysisResult = decode(json!({"word": "gehen", "gender": "  "})).unwrap();
        assert_eq!(result.gender, None);
    }

    #[test]
    fn analysis_missing_word_is_a_decode_error() {
        let err = decode::<AnalysisResult>(json!({"translation": "house"})).unwrap_err();
        assert!(matches!(err, LlmError::Decode { kind: "word analysis", .. }));
    }

    #[test]
    fn analysis_with_wrong_types_is_a_decode_error() {
        let err = decode::<AnalysisResult>(json!({"word": 12})).unwrap_err();
        assert!(matches!(err, LlmError::Decode { .. }));

        let err = decode::<AnalysisResult>(json!({"word": "Haus", "wasCorrected": "yes"}))
            .unwrap_err();
        assert!(matches!(err, LlmError::Decode { .. }));
    }

    #[test]
    fn short_conjugation_row_is_rejected() {
        let value = json!({
            "word": "gehen",
            "grammar": {"conjugation": {"present": ["gehe", "gehst", "geht"]}}
        });
        let err = decode::<AnalysisResult>(value).unwrap_err();
        assert!(err.to_string().contains("expected 6"));
    }

    #[test]
    fn declension_pair_must_have_two_forms() {
        let value = json!({
            "word": "Haus",
            "grammar": {"declension": {"dative": ["dem Haus"]}}
        });
        assert!(decode::<AnalysisResult>(value).is_err());
    }

    #[test]
    fn analysis_materialises_entry_with_schedule() {
        let result: AnalysisResult = decode(full_analysis()).unwrap();
        let entry = result.into_entry(42);
        assert!(!entry.id.is_empty());
        assert_eq!(entry.next_review, Some(42));
        assert_eq!(entry.last_reviewed, 0);
        assert_eq!(entry.gender.as_deref(), Some("das"));
    }

    #[test]
    fn deconstruction_requires_parts() {
        let ok: DeconstructionResult = decode(json!({
            "parts": [
                {"german": "Hand", "english": "hand", "type": "noun"},
                {"german": "Schuh", "english": "shoe", "type": "noun"}
            ],
            "meaning": "glove"
        }))
        .unwrap();
        assert_eq!(ok.parts.len(), 2);
        assert_eq!(ok.parts[0].kind.as_deref(), Some("noun"));

        assert!(decode::<DeconstructionResult>(json!({"parts": [], "meaning": "x"})).is_err());
    }

    #[test]
    fn correction_errors_default_to_empty() {
        let result: CorrectionResult = decode(json!({"corrected": "Ich bin gegangen."})).unwrap();
        assert!(result.errors.is_empty());
    }

    #[test]
    fn deck_decodes_array_and_rejects_object() {
        let items: Vec<DeckItem> = decode_list(json!([
            {"word": "Zug", "translation": "train", "gender": "der", "partOfSpeech": "noun"},
            {"word": "fahren", "translation": "to drive"}
        ]))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].gender, None);

        let err = decode_list::<DeckItem>(json!({"word": "Zug"})).unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn one_bad_deck_item_fails_the_list() {
        let result = decode_list::<DeckItem>(json!([{"word": "Zug"}, {"translation": "no word"}]));
        assert!(result.is_err());
    }

    #[test]
    fn deck_items_get_distinct_ids() {
        let a = DeckItem {
            word: "Zug".into(),
            translation: None,
            gender: None,
            part_of_speech: None,
        };
        let b = a.clone();
        assert_ne!(a.into_entry(0).id, b.into_entry(0).id);
    }

    #[test]
    fn idiom_uses_german_key() {
        let idiom: Idiom = decode(json!({
            "german": "Tomaten auf den Augen haben",
            "literal": "to have tomatoes on the eyes",
            "meaning": "to not see something obvious",
            "context": "teasing"
        }))
        .unwrap();
        assert_eq!(idiom.phrase, "Tomaten auf den Augen haben");
    }

    #[test]
    fn quiz_and_dictation_require_text() {
        assert!(decode::<GenderQuizCard>(json!({"word": "Tisch", "gender": ""})).is_err());
        assert!(decode::<DictationSentence>(json!({"text": " "})).is_err());
        assert!(decode::<SentenceGame>(json!({"sentence": "Ich gehe.", "translation": "I go.", "parts": []})).is_err());
    }
}
