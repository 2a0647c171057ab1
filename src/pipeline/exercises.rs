//! Local answer checks for the practice tools.  None of these touch the
//! network.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::llm::SentenceGame;

/// Characters stripped from a clicked token before it is glossed.
const TOKEN_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Strip punctuation from a token picked out of a reading passage.
///
/// ```
/// use german_tutor::pipeline::exercises::clean_token;
///
/// assert_eq!(clean_token("(Hause)."), "Hause");
/// ```
pub fn clean_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !TOKEN_PUNCTUATION.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn strip_stops(text: &str) -> String {
    text.replace(['.', ','], "").trim().to_string()
}

/// Sentence builder: the chosen parts, joined by single spaces, must equal
/// the target once `.` and `,` are removed from both.  Case matters.
pub fn check_sentence<S: AsRef<str>>(chosen: &[S], target: &str) -> bool {
    let attempt = chosen
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    strip_stops(&attempt) == strip_stops(target)
}

/// Dictation: like [`check_sentence`] but case-insensitive.
pub fn check_dictation(attempt: &str, target: &str) -> bool {
    strip_stops(&attempt.to_lowercase()) == strip_stops(&target.to_lowercase())
}

/// Gender quiz: trimmed, case-insensitive article comparison.
pub fn check_gender(guess: &str, answer: &str) -> bool {
    guess.trim().to_lowercase() == answer.trim().to_lowercase()
}

/// Remove a leading `der `, `die ` or `das ` from a generated noun.
pub fn strip_article(noun: &str) -> String {
    let trimmed = noun.trim();
    for article in ["der", "die", "das"] {
        let Some(head) = trimmed.get(..article.len()) else {
            continue;
        };
        let rest = &trimmed[article.len()..];
        if head.eq_ignore_ascii_case(article) && rest.starts_with(char::is_whitespace) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

// ---------------------------------------------------------------------------
// SentenceBuilder
// ---------------------------------------------------------------------------

/// Word-tile state for one sentence game: tiles move between the shuffled
/// pool and the learner's answer line.
#[derive(Debug, Clone)]
pub struct SentenceBuilder {
    sentence: String,
    translation: String,
    pool: Vec<String>,
    chosen: Vec<String>,
}

impl SentenceBuilder {
    /// Start a game with the parts shuffled.
    pub fn new<R: Rng + ?Sized>(game: SentenceGame, rng: &mut R) -> Self {
        let mut pool = game.parts;
        pool.shuffle(rng);
        Self {
            sentence: game.sentence,
            translation: game.translation,
            pool,
            chosen: Vec::new(),
        }
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn chosen(&self) -> &[String] {
        &self.chosen
    }

    /// Move pool tile `index` to the end of the answer line.
    pub fn pick(&mut self, index: usize) -> bool {
        if index >= self.pool.len() {
            return false;
        }
        let tile = self.pool.remove(index);
        self.chosen.push(tile);
        true
    }

    /// Move answer tile `index` back to the end of the pool.
    pub fn unpick(&mut self, index: usize) -> bool {
        if index >= self.chosen.len() {
            return false;
        }
        let tile = self.chosen.remove(index);
        self.pool.push(tile);
        true
    }

    pub fn is_correct(&self) -> bool {
        check_sentence(self.chosen.as_slice(), &self.sentence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sentence_check_ignores_trailing_punctuation() {
        assert!(check_sentence(&["Ich", "gehe", "nach", "Hause"], "Ich gehe nach Hause."));
    }

    #[test]
    fn sentence_check_is_case_sensitive_and_ordered() {
        assert!(!check_sentence(&["ich", "gehe", "nach", "Hause"], "Ich gehe nach Hause."));
        assert!(!check_sentence(&["Ich", "nach", "gehe", "Hause"], "Ich gehe nach Hause."));
    }

    #[test]
    fn sentence_check_drops_commas() {
        assert!(check_sentence(&["Ja", "ich", "komme"], "Ja, ich komme."));
    }

    #[test]
    fn dictation_ignores_case() {
        assert!(check_dictation("ich trinke kaffee", "Ich trinke Kaffee."));
        assert!(!check_dictation("ich trinke tee", "Ich trinke Kaffee."));
    }

    #[test]
    fn gender_check_trims_and_ignores_case() {
        assert!(check_gender(" Der ", "der"));
        assert!(!check_gender("die", "das"));
    }

    #[test]
    fn article_is_stripped_from_generated_noun() {
        assert_eq!(strip_article("Der Tisch"), "Tisch");
        assert_eq!(strip_article("das  Buch "), "Buch");
        assert_eq!(strip_article("Dieb"), "Dieb");
        assert_eq!(strip_article("Dasein"), "Dasein");
    }

    #[test]
    fn clean_token_strips_gloss_punctuation() {
        assert_eq!(clean_token("Hause."), "Hause");
        assert_eq!(clean_token("\"Ja\","), "\"Ja\"");
        assert_eq!(clean_token("{~Straße!}"), "Straße");
    }

    #[test]
    fn builder_moves_tiles_and_checks() {
        let game = SentenceGame {
            sentence: "Ich gehe nach Hause.".into(),
            translation: "I am going home.".into(),
            parts: vec!["Ich".into(), "gehe".into(), "nach".into(), "Hause".into()],
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut builder = SentenceBuilder::new(game, &mut rng);
        assert_eq!(builder.pool().len(), 4);

        for word in ["Ich", "gehe", "nach", "Hause"] {
            let index = builder.pool().iter().position(|w| w == word).unwrap();
            assert!(builder.pick(index));
        }
        assert!(builder.pool().is_empty());
        assert!(builder.is_correct());

        assert!(builder.unpick(0));
        assert_eq!(builder.pool(), ["Ich".to_string()]);
        assert!(!builder.is_correct());
        assert!(!builder.pick(5));
    }
}
