//! Fixed experience rewards per completed action.

use crate::review::XP_PER_REVIEW;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Analysis,
    Deconstruction,
    ChatTurn,
    SentenceBuilt,
    GenderQuizCorrect,
    GrammarCorrection,
    Idiom,
    DictationCorrect,
    /// A finished review session with this many items rated.
    Review(usize),
}

impl Reward {
    pub fn points(self) -> u64 {
        match self {
            Reward::Analysis => 5,
            Reward::Deconstruction => 20,
            Reward::ChatTurn => 15,
            Reward::SentenceBuilt => 50,
            Reward::GenderQuizCorrect => 10,
            Reward::GrammarCorrection => 25,
            Reward::Idiom => 5,
            Reward::DictationCorrect => 30,
            Reward::Review(items) => items as u64 * XP_PER_REVIEW,
        }
    }
}
