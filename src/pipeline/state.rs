//! Per-tool display state and request sequencing.
//!
//! A tool screen can fire a second request before the first resolves.
//! [`ToolSlot::begin`] hands out a monotonically increasing [`Ticket`];
//! [`ToolSlot::complete`] only applies a result whose ticket is still the
//! latest, so a slow stale response can never overwrite a newer one.
//!
//! ```text
//! Idle ──begin──▶ Loading ──complete(Ok)──▶ Ready
//!                         ──complete(Err)─▶ Failed
//! any  ──begin──▶ Loading   (earlier tickets become stale)
//! ```

use std::fmt::Display;

/// Message shown when a tool request fails, whatever the cause.
pub const FAILURE_MESSAGE: &str = "Analysis failed.";

// ---------------------------------------------------------------------------
// ToolState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ToolState<T> {
    Idle,
    Loading,
    Ready(T),
    /// User-facing failure text.
    Failed(String),
}

impl<T> ToolState<T> {
    /// ```
    /// use german_tutor::pipeline::ToolState;
    ///
    /// assert!(!ToolState::<()>::Idle.is_busy());
    /// assert!(ToolState::<()>::Loading.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, ToolState::Loading)
    }

    /// A short label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            ToolState::Idle => "Idle",
            ToolState::Loading => "Loading",
            ToolState::Ready(_) => "Done",
            ToolState::Failed(_) => "Error",
        }
    }
}

impl<T> Default for ToolState<T> {
    fn default() -> Self {
        ToolState::Idle
    }
}

// ---------------------------------------------------------------------------
// ToolSlot
// ---------------------------------------------------------------------------

/// Identifies one request issued by a [`ToolSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct ToolSlot<T> {
    state: ToolState<T>,
    issued: u64,
}

impl<T> ToolSlot<T> {
    pub fn new() -> Self {
        Self {
            state: ToolState::Idle,
            issued: 0,
        }
    }

    pub fn state(&self) -> &ToolState<T> {
        &self.state
    }

    /// Start a request.  Every earlier ticket becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.state = ToolState::Loading;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Apply the outcome of `ticket`'s request.  Returns `false`, leaving the
    /// state untouched, when a newer request has been started since.
    ///
    /// Errors are logged and replaced with [`FAILURE_MESSAGE`].
    pub fn complete<E: Display>(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if !self.is_current(ticket) {
            log::debug!("discarding stale result for ticket {}", ticket.0);
            return false;
        }
        self.state = match result {
            Ok(value) => ToolState::Ready(value),
            Err(e) => {
                log::warn!("tool request failed: {e}");
                ToolState::Failed(FAILURE_MESSAGE.to_string())
            }
        };
        true
    }

    /// Back to `Idle`; outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = ToolState::Idle;
    }
}

impl<T> Default for ToolSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
