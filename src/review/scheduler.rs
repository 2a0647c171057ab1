//! Fixed-interval review scheduling and the review session state machine.
//!
//! ```text
//! ReviewSession::new ──queue empty──▶ NothingDue
//!                    ──otherwise────▶ Presenting ──reveal──▶ Revealed
//!                                        ▲                      │ rate
//!                                        └──── next item ◀──────┤
//!                                                               └─ queue exhausted ─▶ Complete
//! ```
//!
//! Intervals do not adapt: there is no ease factor or streak memory.

use std::fmt;
use std::str::FromStr;

use crate::store::VocabularyEntry;

/// Experience awarded per item reviewed, paid when a session completes.
pub const XP_PER_REVIEW: u64 = 10;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Delay until the entry is due again.
    ///
    /// ```
    /// use german_tutor::review::Rating;
    ///
    /// assert_eq!(Rating::Hard.interval_ms(), 10 * 60 * 1000);
    /// assert_eq!(Rating::Good.interval_ms(), 24 * 60 * 60 * 1000);
    /// assert_eq!(Rating::Easy.interval_ms(), 3 * 24 * 60 * 60 * 1000);
    /// ```
    pub fn interval_ms(self) -> i64 {
        match self {
            Rating::Hard => 600_000,
            Rating::Good => 86_400_000,
            Rating::Easy => 259_200_000,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        })
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" | "h" | "1" => Ok(Rating::Hard),
            "good" | "g" | "2" => Ok(Rating::Good),
            "easy" | "e" | "3" => Ok(Rating::Easy),
            other => Err(format!("unknown rating {other:?} (hard, good or easy)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Entries due at `now_ms`, in collection order.  A missing `next_review`
/// counts as due.
pub fn due_queue(entries: &[VocabularyEntry], now_ms: i64) -> Vec<VocabularyEntry> {
    entries
        .iter()
        .filter(|e| e.is_due(now_ms))
        .cloned()
        .collect()
}

/// Apply `rating` to `entry` at `now_ms`.
pub fn schedule(entry: &mut VocabularyEntry, rating: Rating, now_ms: i64) {
    entry.next_review = Some(now_ms + rating.interval_ms());
    entry.last_reviewed = now_ms;
}

// ---------------------------------------------------------------------------
// ReviewSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Nothing was due when the session started.
    NothingDue,
    /// Only the prompt word of the current item is shown.
    Presenting,
    /// The full answer is shown and a rating is expected.
    Revealed,
    /// Every queued item was rated.
    Complete,
}

/// One pass over the due queue.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    queue: Vec<VocabularyEntry>,
    index: usize,
    state: ReviewState,
}

impl ReviewSession {
    /// Build the queue from `entries` at `now_ms`.
    pub fn new(entries: &[VocabularyEntry], now_ms: i64) -> Self {
        let queue = due_queue(entries, now_ms);
        let state = if queue.is_empty() {
            ReviewState::NothingDue
        } else {
            ReviewState::Presenting
        };
        Self {
            queue,
            index: 0,
            state,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    /// The item under review, if the session is still running.
    pub fn current(&self) -> Option<&VocabularyEntry> {
        match self.state {
            ReviewState::Presenting | ReviewState::Revealed => self.queue.get(self.index),
            ReviewState::NothingDue | ReviewState::Complete => None,
        }
    }

    /// Show the answer.  No effect outside `Presenting`.
    pub fn reveal(&mut self) {
        if self.state == ReviewState::Presenting {
            self.state = ReviewState::Revealed;
        }
    }

    /// Rate the revealed item and advance.  Returns the rescheduled entry for
    /// the caller to persist, or `None` when no item is revealed.
    pub fn rate(&mut self, rating: Rating, now_ms: i64) -> Option<VocabularyEntry> {
        if self.state != ReviewState::Revealed {
            return None;
        }
        let entry = self.queue.get_mut(self.index)?;
        schedule(entry, rating, now_ms);
        let updated = entry.clone();

        self.index += 1;
        self.state = if self.index >= self.queue.len() {
            ReviewState::Complete
        } else {
            ReviewState::Presenting
        };
        Some(updated)
    }

    /// Items rated so far.
    pub fn reviewed(&self) -> usize {
        self.index
    }

    /// Items still to rate, including the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len() - self.index
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, ReviewState::NothingDue | ReviewState::Complete)
    }

    /// Reward owed for this session: [`XP_PER_REVIEW`] per item rated.
    pub fn experience_earned(&self) -> u64 {
        self.reviewed() as u64 * XP_PER_REVIEW
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn entry(word: &str, next_review: Option<i64>) -> VocabularyEntry {
        let mut entry = VocabularyEntry::new(word, 0);
        entry.next_review = next_review;
        entry
    }

    #[test]
    fn due_queue_includes_past_and_missing_only() {
        let entries = vec![
            entry("past", Some(NOW - 1_000)),
            entry("future", Some(NOW + 1_000)),
            entry("missing", None),
        ];
        let words: Vec<String> = due_queue(&entries, NOW).into_iter().map(|e| e.word).collect();
        assert_eq!(words, vec!["past", "missing"]);
    }

    #[test]
    fn entry_due_exactly_now_is_included() {
        assert_eq!(due_queue(&[entry("jetzt", Some(NOW))], NOW).len(), 1);
    }

    #[test]
    fn ratings_set_fixed_intervals() {
        for (rating, expected) in [
            (Rating::Hard, 600_000),
            (Rating::Good, 86_400_000),
            (Rating::Easy, 259_200_000),
        ] {
            let mut e = entry("x", None);
            schedule(&mut e, rating, NOW);
            let delta = e.next_review.unwrap() - NOW;
            assert!((expected - 1_000..=expected + 1_000).contains(&delta));
            assert_eq!(e.last_reviewed, NOW);
        }
    }

    #[test]
    fn empty_queue_is_nothing_due() {
        let session = ReviewSession::new(&[entry("later", Some(NOW + 1))], NOW);
        assert_eq!(session.state(), ReviewState::NothingDue);
        assert!(session.current().is_none());
        assert!(session.is_finished());
        assert_eq!(session.experience_earned(), 0);
    }

    #[test]
    fn session_walks_through_queue() {
        let entries = vec![entry("eins", None), entry("zwei", Some(NOW))];
        let mut session = ReviewSession::new(&entries, NOW);
        assert_eq!(session.state(), ReviewState::Presenting);
        assert_eq!(session.current().unwrap().word, "eins");

        // Rating before reveal is ignored.
        assert!(session.rate(Rating::Good, NOW).is_none());

        session.reveal();
        assert_eq!(session.state(), ReviewState::Revealed);
        let first = session.rate(Rating::Hard, NOW).unwrap();
        assert_eq!(first.word, "eins");
        assert_eq!(first.next_review, Some(NOW + 600_000));

        assert_eq!(session.state(), ReviewState::Presenting);
        assert_eq!(session.remaining(), 1);
        session.reveal();
        session.rate(Rating::Easy, NOW).unwrap();

        assert_eq!(session.state(), ReviewState::Complete);
        assert_eq!(session.reviewed(), 2);
        assert_eq!(session.experience_earned(), 20);
        assert!(session.rate(Rating::Easy, NOW).is_none());
    }

    #[test]
    fn rating_parses_names_and_shortcuts() {
        assert_eq!("Hard".parse::<Rating>().unwrap(), Rating::Hard);
        assert_eq!("g".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!("3".parse::<Rating>().unwrap(), Rating::Easy);
        assert!("meh".parse::<Rating>().is_err());
    }
}
