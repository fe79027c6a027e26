//! Refresh trigger for reference parameters.
//!
//! Free-text edits on the referenced parameter wait for a quiet period before
//! a refresh is requested; discrete selection changes refresh immediately. A
//! new event always cancels the pending timer. This only bounds request
//! volume; the options endpoint is idempotent.

use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Keystroke in a free-text input.
    TextInput,
    /// Selection change in a dropdown, radio group or checkbox.
    Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    RefreshNow,
    Scheduled { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct RefreshDebouncer {
    quiet_period: Duration,
    pending: Option<Instant>,
}

impl Default for RefreshDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl RefreshDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub fn on_event(&mut self, event: TriggerEvent, now: Instant) -> TriggerAction {
        self.pending = None;
        match event {
            TriggerEvent::Selection => TriggerAction::RefreshNow,
            TriggerEvent::TextInput => {
                let deadline = now + self.quiet_period;
                self.pending = Some(deadline);
                TriggerAction::Scheduled { deadline }
            }
        }
    }

    /// Returns true exactly once when the pending timer has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
