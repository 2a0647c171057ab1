//! Spaced-repetition review.
//!
//! [`ReviewSession`] walks the due subset of the collection; each rating
//! yields a rescheduled entry the caller persists through
//! [`VocabularyStore::upsert`](crate::store::VocabularyStore::upsert).

pub mod scheduler;

pub use scheduler::{due_queue, schedule, Rating, ReviewSession, ReviewState, XP_PER_REVIEW};
