//! German tutor: AI-generated vocabulary and practice content with a
//! per-learner spaced-review collection.
//!
//! * [`config`] — TOML settings and platform paths.
//! * [`llm`] — inference client, prompts, reply parsing and typed decoders.
//! * [`pipeline`] — the content tools, practice exercises and rewards.
//! * [`review`] — fixed-interval review scheduling.
//! * [`store`] — identity, document store and the vocabulary collection.

pub mod config;
pub mod llm;
pub mod pipeline;
pub mod review;
pub mod store;
