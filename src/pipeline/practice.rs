//! Practice tools: roleplay chat, sentence builder, dictation, gender quiz
//! and daily review.
//!
//! Generation goes through the inference backend; answers are checked
//! locally with [`super::exercises`] and rewarded only when correct.

use rand::Rng;

use super::content::{non_blank, ContentPipeline, PipelineError};
use super::exercises::{check_dictation, check_gender, strip_article, SentenceBuilder};
use super::rewards::Reward;
use crate::llm::{
    decode, ChatRole, Conversation, DictationSentence, GenderQuizCard, ProficiencyLevel,
    RoleplayReply, SentenceGame,
};
use crate::review::{Rating, ReviewSession};
use crate::store::VocabularyEntry;

/// Outcome of a dictation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DictationOutcome {
    pub correct: bool,
    /// Explanation of the mistakes, for wrong attempts when available.
    pub feedback: Option<String>,
}

impl ContentPipeline {
    // -----------------------------------------------------------------------
    // Roleplay
    // -----------------------------------------------------------------------

    /// A fresh conversation opened by the persona's greeting.
    pub fn start_roleplay(&self, persona: &str) -> Conversation {
        let mut conversation = Conversation::new(persona);
        conversation.push(
            ChatRole::Ai,
            format!("Hallo! Was darf es heute sein? (Role: {persona})"),
        );
        conversation
    }

    /// Send one learner turn.  The learner's message stays in the history
    /// even if the reply fails.
    pub async fn roleplay_turn(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        level: ProficiencyLevel,
    ) -> Result<RoleplayReply, PipelineError> {
        let user_text = non_blank(user_text)?;
        let history = conversation.transcript();
        conversation.push(ChatRole::User, user_text);

        let prompt = self.prompts.roleplay_turn(
            conversation.persona(),
            user_text,
            level,
            history.as_deref(),
        );
        let raw = self.backend.generate_text(&prompt).await?;
        let reply = RoleplayReply::parse(&raw);
        conversation.push(ChatRole::Ai, reply.raw.clone());

        self.reward(Reward::ChatTurn).await?;
        Ok(reply)
    }

    // -----------------------------------------------------------------------
    // Sentence builder
    // -----------------------------------------------------------------------

    /// Generate a sentence and shuffle its words into a tile pool.
    pub async fn sentence_game(
        &self,
        level: ProficiencyLevel,
    ) -> Result<SentenceBuilder, PipelineError> {
        let value = self
            .backend
            .generate_json(&self.prompts.sentence_game(level))
            .await?;
        let game: SentenceGame = decode(value)?;
        Ok(SentenceBuilder::new(game, &mut rand::thread_rng()))
    }

    /// Check the arranged tiles; a correct answer is rewarded.
    pub async fn submit_sentence(&self, builder: &SentenceBuilder) -> Result<bool, PipelineError> {
        let correct = builder.is_correct();
        if correct {
            self.reward(Reward::SentenceBuilt).await?;
        }
        Ok(correct)
    }

    // -----------------------------------------------------------------------
    // Dictation
    // -----------------------------------------------------------------------

    /// A short sentence for the learner to hear and write down.
    pub async fn dictation(
        &self,
        level: ProficiencyLevel,
    ) -> Result<DictationSentence, PipelineError> {
        let value = self
            .backend
            .generate_json(&self.prompts.dictation_sentence(level))
            .await?;
        Ok(decode(value)?)
    }

    /// Check an attempt.  Wrong attempts get a short explanation when the
    /// backend can provide one.
    pub async fn submit_dictation(
        &self,
        target: &str,
        attempt: &str,
        level: ProficiencyLevel,
    ) -> Result<DictationOutcome, PipelineError> {
        if check_dictation(attempt, target) {
            self.reward(Reward::DictationCorrect).await?;
            return Ok(DictationOutcome {
                correct: true,
                feedback: None,
            });
        }

        let prompt = self.prompts.dictation_feedback(target, attempt, level);
        let feedback = match self.backend.generate_text(&prompt).await {
            Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("dictation feedback unavailable: {e}");
                None
            }
        };
        Ok(DictationOutcome {
            correct: false,
            feedback,
        })
    }

    // -----------------------------------------------------------------------
    // Gender quiz
    // -----------------------------------------------------------------------

    /// A random noun with its article removed.
    pub async fn gender_quiz(
        &self,
        level: ProficiencyLevel,
    ) -> Result<GenderQuizCard, PipelineError> {
        let seed = rand::thread_rng().gen_range(0..10_000);
        let value = self
            .backend
            .generate_json(&self.prompts.gender_quiz(level, seed))
            .await?;
        let mut card: GenderQuizCard = decode(value)?;
        card.word = strip_article(&card.word);
        Ok(card)
    }

    /// Check a guessed article; a correct guess is rewarded.
    pub async fn submit_gender(
        &self,
        card: &GenderQuizCard,
        guess: &str,
    ) -> Result<bool, PipelineError> {
        let correct = check_gender(guess, &card.gender);
        if correct {
            self.reward(Reward::GenderQuizCorrect).await?;
        }
        Ok(correct)
    }

    // -----------------------------------------------------------------------
    // Review
    // -----------------------------------------------------------------------

    /// Start a review over the current collection.
    pub fn start_review(&self, now_ms: i64) -> ReviewSession {
        ReviewSession::new(&self.store.snapshot().entries, now_ms)
    }

    /// Rate the revealed item and persist its new schedule.  Only the
    /// schedule fields are written; an entry deleted since the session
    /// started fails with [`StoreError::NotFound`](crate::store::StoreError::NotFound)
    /// and stays deleted.
    pub async fn rate_review(
        &self,
        session: &mut ReviewSession,
        rating: Rating,
        now_ms: i64,
    ) -> Result<Option<VocabularyEntry>, PipelineError> {
        let Some(entry) = session.rate(rating, now_ms) else {
            return Ok(None);
        };
        let next_review = entry.next_review.unwrap_or(now_ms);
        self.store
            .reschedule(&entry.id, next_review, entry.last_reviewed)
            .await?;
        Ok(Some(entry))
    }

    /// Pay the session reward; returns the experience awarded.
    pub async fn finish_review(&self, session: &ReviewSession) -> Result<u64, PipelineError> {
        let reward = Reward::Review(session.reviewed());
        self.reward(reward).await?;
        Ok(reward.points())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
