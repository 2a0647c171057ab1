//! Prompt catalog for every AI-backed learning tool.
//!
//! [`PromptCatalog`] builds one prompt per tool.  Prompts that expect
//! structured output end with an explicit JSON schema so that the parsed
//! value can be decoded deterministically by [`crate::llm::results`];
//! free-text prompts (simplification, roleplay, dictation feedback) never ask
//! for JSON.  Every prompt names the learner's [`ProficiencyLevel`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProficiencyLevel
// ---------------------------------------------------------------------------

/// The six ordered CEFR tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl ProficiencyLevel {
    /// All tiers, easiest first.
    pub const ALL: [ProficiencyLevel; 6] = [
        ProficiencyLevel::A1,
        ProficiencyLevel::A2,
        ProficiencyLevel::B1,
        ProficiencyLevel::B2,
        ProficiencyLevel::C1,
        ProficiencyLevel::C2,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "A1",
            ProficiencyLevel::A2 => "A2",
            ProficiencyLevel::B1 => "B1",
            ProficiencyLevel::B2 => "B2",
            ProficiencyLevel::C1 => "C1",
            ProficiencyLevel::C2 => "C2",
        }
    }
}

impl Default for ProficiencyLevel {
    fn default() -> Self {
        Self::A1
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.code() == wanted)
            .ok_or_else(|| format!("unknown proficiency level {s:?} (expected A1..C2)"))
    }
}

// ---------------------------------------------------------------------------
// Output schemas
// ---------------------------------------------------------------------------

const ANALYSIS_SCHEMA: &str = r#"{ "word": "BaseForm", "wasCorrected": boolean, "originalInput": "{input}", "gender": "der/die/das", "translation": "English", "definition": "def", "ipa": "ipa", "partOfSpeech": "noun/verb", "grammar": { "plural": "pl", "declension": {"nominative": ["s","p"], "accusative": ["s","p"], "dative": ["s","p"], "genitive": ["s","p"]}, "conjugation": {"present": ["ich","du","er","wir","ihr","sie"]} }, "exampleSentence": {"text": "sentence", "translation": "en"} }"#;

const DECONSTRUCTION_SCHEMA: &str =
    r#"{ "parts": [{"german": "root", "english": "meaning", "type": "noun/adj"}], "meaning": "full meaning" }"#;

const GLOSS_SCHEMA: &str =
    r#"{"word": "{input}", "gender": "der/die/das", "translation": "English", "type": "noun/etc"}"#;

const SENTENCE_GAME_SCHEMA: &str =
    r#"{"sentence": "sentence", "translation": "English translation", "parts": ["shuffled", "array", "of", "words"]}"#;

const CORRECTION_SCHEMA: &str = r#"{"corrected": "full corrected text", "errors": [{"original": "wrong segment", "correction": "right segment", "explanation": "why"}]}"#;

const IDIOM_SCHEMA: &str =
    r#"{"german": "phrase", "literal": "literal translation", "meaning": "actual meaning", "context": "when to use"}"#;

const DECK_SCHEMA: &str =
    r#"[{"word": "Wort", "translation": "Word", "gender": "der", "partOfSpeech": "noun"}]"#;

const DICTATION_SCHEMA: &str = r#"{"text": "sentence"}"#;

const GENDER_QUIZ_SCHEMA: &str = r#"{"word": "Noun", "gender": "der/die/das"}"#;

// ---------------------------------------------------------------------------
// PromptCatalog
// ---------------------------------------------------------------------------

/// Builds tool prompts for one target language.
///
/// # Example
/// ```rust
/// use german_tutor::llm::{ProficiencyLevel, PromptCatalog};
///
/// let catalog = PromptCatalog::new("German");
/// let prompt = catalog.analyze_word("Häuser", ProficiencyLevel::B1);
/// assert!(prompt.contains("Level B1"));
/// assert!(prompt.contains("\"wasCorrected\""));
/// ```
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    language: String,
}

impl PromptCatalog {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Full lexical analysis of one word, normalised to its base form.
    pub fn analyze_word(&self, term: &str, level: ProficiencyLevel) -> String {
        format!(
            "Analyze {lang} word \"{term}\". If declined/conjugated, use BASE FORM. If misspelled, correct. \
             Level {level}. JSON: {schema}",
            lang = self.language,
            schema = ANALYSIS_SCHEMA.replace("{input}", term),
        )
    }

    /// Break a compound word into its roots.
    pub fn deconstruct(&self, word: &str, level: ProficiencyLevel) -> String {
        format!(
            "Break down the {lang} compound word \"{word}\". Explain the parts for a Level {level} learner. \
             Return JSON: {DECONSTRUCTION_SCHEMA}",
            lang = self.language,
        )
    }

    /// Rewrite a passage at the learner's level.  Free text.
    pub fn simplify(&self, text: &str, level: ProficiencyLevel) -> String {
        format!(
            "Rewrite the following {lang} text to {level} level for a learner. \
             Simplify grammar and vocabulary but keep the meaning. Text: \"{text}\"",
            lang = self.language,
        )
    }

    /// Short gloss for a word clicked in the reader.  `word` should already
    /// be stripped of punctuation (see [`crate::pipeline::exercises::clean_token`]).
    pub fn gloss(&self, word: &str, level: ProficiencyLevel) -> String {
        format!(
            "Analyze brief {lang} word \"{word}\" for a Level {level} reader. JSON: {schema}",
            lang = self.language,
            schema = GLOSS_SCHEMA.replace("{input}", word),
        )
    }

    /// One roleplay reply.  Free text; a grammar correction, if any, goes in
    /// square brackets after the reply.
    ///
    /// `history` is the transcript built by
    /// [`Conversation::transcript`](crate::llm::Conversation::transcript).
    pub fn roleplay_turn(
        &self,
        persona: &str,
        user_text: &str,
        level: ProficiencyLevel,
        history: Option<&str>,
    ) -> String {
        let mut prompt = String::with_capacity(512);
        prompt.push_str(&format!(
            "Roleplay scenario: You are a {persona} in Germany. The user is a customer.\n\
             Level: The user is at CEFR Level {level}. Adjust your vocabulary and grammar complexity to match {level}.\n"
        ));
        prompt.push_str("History:\n");
        if let Some(history) = history {
            prompt.push_str(history);
            if !history.ends_with('\n') {
                prompt.push('\n');
            }
        }
        prompt.push_str(&format!(
            "User: {user_text}\n\nReply in {lang} naturally. Keep it short (1-2 sentences). \
             Then, in brackets [], provide a correction if the user made a grammar mistake.",
            lang = self.language,
        ));
        prompt
    }

    /// A sentence to be reassembled from shuffled words.
    pub fn sentence_game(&self, level: ProficiencyLevel) -> String {
        format!(
            "Generate a {lang} sentence appropriate for CEFR Level {level}. Return JSON: {SENTENCE_GAME_SCHEMA}",
            lang = self.language,
        )
    }

    /// Grammar correction with per-error explanations.
    pub fn correct_text(&self, text: &str, level: ProficiencyLevel) -> String {
        format!(
            "Correct this {lang} text: \"{text}\". Explain each error for a Level {level} learner. \
             Return JSON: {CORRECTION_SCHEMA}",
            lang = self.language,
        )
    }

    /// A common idiom with literal and actual meaning.
    pub fn idiom(&self, level: ProficiencyLevel) -> String {
        format!(
            "Generate a random popular {lang} idiom suitable for a Level {level} learner. JSON: {IDIOM_SCHEMA}",
            lang = self.language,
        )
    }

    /// `count` vocabulary items for a topic deck.
    pub fn starter_deck(&self, topic: &str, count: usize, level: ProficiencyLevel) -> String {
        format!(
            "Generate {count} {lang} words for {topic} (Level {level}). JSON array: {DECK_SCHEMA}",
            lang = self.language,
        )
    }

    /// A short sentence to be read aloud and transcribed by the learner.
    pub fn dictation_sentence(&self, level: ProficiencyLevel) -> String {
        format!(
            "Generate a short {lang} sentence appropriate for CEFR Level {level}. JSON: {DICTATION_SCHEMA}",
            lang = self.language,
        )
    }

    /// Explain a failed dictation attempt.  Free text.
    pub fn dictation_feedback(&self, target: &str, attempt: &str, level: ProficiencyLevel) -> String {
        format!(
            "A Level {level} learner heard the {lang} sentence \"{target}\" and wrote \"{attempt}\". \
             In one or two short sentences of English, point out what they misheard or misspelled.",
            lang = self.language,
        )
    }

    /// A random noun for the article quiz.  `seed` nudges the model away from
    /// repeating the same noun.
    pub fn gender_quiz(&self, level: ProficiencyLevel, seed: u32) -> String {
        format!(
            "Generate random {lang} noun (Level {level}). Return noun ONLY (no article). Seed: {seed}. \
             JSON: {GENDER_QUIZ_SCHEMA}",
            lang = self.language,
        )
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::new("German")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn structured_prompts(c: &PromptCatalog, level: ProficiencyLevel) -> Vec<String> {
        vec![
            c.analyze_word("Häuser", level),
            c.deconstruct("Handschuh", level),
            c.gloss("Brot", level),
            c.sentence_game(level),
            c.correct_text("Ich habe gegeht.", level),
            c.idiom(level),
            c.starter_deck("travel", 15, level),
            c.dictation_sentence(level),
            c.gender_quiz(level, 42),
        ]
    }

    fn free_text_prompts(c: &PromptCatalog, level: ProficiencyLevel) -> Vec<String> {
        vec![
            c.simplify("Der Vertrag wurde unterzeichnet.", level),
            c.roleplay_turn("waiter", "Ich möchte ein Kaffee", level, None),
            c.dictation_feedback("Ich gehe.", "Ich gehen.", level),
        ]
    }

    #[test]
    fn every_prompt_mentions_the_level() {
        let catalog = PromptCatalog::default();
        for level in ProficiencyLevel::ALL {
            for prompt in structured_prompts(&catalog, level)
                .into_iter()
                .chain(free_text_prompts(&catalog, level))
            {
                assert!(prompt.contains(level.code()), "missing {level}: {prompt}");
            }
        }
    }

    #[test]
    fn structured_prompts_carry_a_schema() {
        let catalog = PromptCatalog::default();
        for prompt in structured_prompts(&catalog, ProficiencyLevel::A2) {
            assert!(prompt.contains("JSON"), "no schema marker: {prompt}");
            assert!(prompt.contains('{') || prompt.contains('['));
        }
    }

    #[test]
    fn free_text_prompts_never_request_json() {
        let catalog = PromptCatalog::default();
        for prompt in free_text_prompts(&catalog, ProficiencyLevel::B2) {
            assert!(!prompt.contains("JSON"), "unexpected JSON request: {prompt}");
        }
    }

    #[test]
    fn analysis_embeds_the_original_input() {
        let prompt = PromptCatalog::default().analyze_word("ging", ProficiencyLevel::A1);
        assert!(prompt.contains("\"ging\""));
        assert!(prompt.contains(r#""originalInput": "ging""#));
        assert!(prompt.contains("BASE FORM"));
    }

    #[test]
    fn deck_prompt_names_topic_and_count() {
        let prompt = PromptCatalog::default().starter_deck("tech", 12, ProficiencyLevel::B1);
        assert!(prompt.contains("Generate 12 German words for tech"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn roleplay_includes_persona_history_and_user_turn() {
        let history = "user: Hallo\nai: Guten Tag!";
        let prompt = PromptCatalog::default().roleplay_turn(
            "baker",
            "Zwei Brötchen, bitte",
            ProficiencyLevel::A2,
            Some(history),
        );
        assert!(prompt.contains("You are a baker"));
        assert!(prompt.contains("ai: Guten Tag!\nUser: Zwei Brötchen, bitte"));
        assert!(prompt.contains("in brackets []"));
    }

    #[test]
    fn gender_quiz_carries_seed() {
        let prompt = PromptCatalog::default().gender_quiz(ProficiencyLevel::A1, 9876);
        assert!(prompt.contains("Seed: 9876"));
    }

    #[test]
    fn language_is_configurable() {
        let prompt = PromptCatalog::new("Dutch").idiom(ProficiencyLevel::C1);
        assert!(prompt.contains("popular Dutch idiom"));
    }

    #[test]
    fn levels_parse_and_order() {
        assert_eq!("b2".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::B2);
        assert!(" C1 ".parse::<ProficiencyLevel>().is_ok());
        assert!("D1".parse::<ProficiencyLevel>().is_err());
        assert!(ProficiencyLevel::A1 < ProficiencyLevel::C2);
        assert_eq!(ProficiencyLevel::default().to_string(), "A1");
    }
}
