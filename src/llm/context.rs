//! Rolling conversation history for the roleplay tool.
//!
//! [`Conversation`] keeps the last *N* turns and renders them as the compact
//! `role: text` transcript that
//! [`PromptCatalog::roleplay_turn`](crate::llm::PromptCatalog::roleplay_turn)
//! embeds in every prompt.  AI replies are split into the spoken reply and
//! the bracketed grammar correction with [`RoleplayReply::parse`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl ChatRole {
    fn label(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

// ---------------------------------------------------------------------------
// RoleplayReply
// ---------------------------------------------------------------------------

/// An AI roleplay reply split into what is said and what is corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleplayReply {
    /// Text before the first `[`, trimmed; this is what gets spoken.
    pub spoken: String,
    /// Bracketed correction with the closing `]` removed, if present.
    pub correction: Option<String>,
    /// The unmodified model output, kept for the transcript.
    pub raw: String,
}

impl RoleplayReply {
    /// ```
    /// use german_tutor::llm::RoleplayReply;
    ///
    /// let reply = RoleplayReply::parse("Gern! [Correction: einen Kaffee]");
    /// assert_eq!(reply.spoken, "Gern!");
    /// assert_eq!(reply.correction.as_deref(), Some("Correction: einen Kaffee"));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut pieces = raw.split('[');
        let spoken = pieces.next().unwrap_or_default().trim().to_string();
        let correction = pieces
            .map(|piece| piece.replace(']', "").trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>();

        Self {
            spoken,
            correction: if correction.is_empty() {
                None
            } else {
                Some(correction.join(" "))
            },
            raw: raw.trim().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Maintains a rolling window of roleplay turns for context injection.
///
/// # Example
/// ```rust
/// use german_tutor::llm::{ChatRole, Conversation};
///
/// let mut convo = Conversation::new("waiter");
/// convo.push(ChatRole::User, "Hallo");
/// assert_eq!(convo.transcript().as_deref(), Some("user: Hallo"));
/// ```
#[derive(Debug, Clone)]
pub struct Conversation {
    persona: String,
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl Conversation {
    /// A conversation that keeps the last 20 messages.
    pub fn new(persona: &str) -> Self {
        Self::with_capacity(persona, 20)
    }

    pub fn with_capacity(persona: &str, max_messages: usize) -> Self {
        Self {
            persona: persona.to_string(),
            messages: VecDeque::with_capacity(max_messages + 1),
            max_messages: max_messages.max(1),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Append a turn; the oldest turns are dropped past the window size.
    pub fn push(&mut self, role: ChatRole, text: impl Into<String>) {
        self.messages.push_back(ChatMessage {
            role,
            text: text.into(),
        });
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    /// Clear the history (e.g. the learner switched persona).
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// `role: text` lines, oldest first, or `None` when nothing was said yet.
    pub fn transcript(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        Some(
            self.messages
                .iter()
                .map(|m| format!("{}: {}", m.role.label(), m.text))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
