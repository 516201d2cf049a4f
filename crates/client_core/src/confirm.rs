//! Two-step confirmation for destructive actions.
//!
//! A request produces a [`PendingConfirmation`] carrying the prompt to show and the
//! payload to act on. The payload is only released by resolving it with
//! [`Decision::Confirmed`]; dropping or cancelling it discards the action.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
}

#[must_use = "a pending confirmation does nothing until it is resolved"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation<T> {
    prompt: String,
    payload: T,
}

impl<T> PendingConfirmation<T> {
    pub fn new(prompt: impl Into<String>, payload: T) -> Self {
        Self {
            prompt: prompt.into(),
            payload,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn resolve(self, decision: Decision) -> Option<T> {
        match decision {
            Decision::Confirmed => Some(self.payload),
            Decision::Cancelled => {
                tracing::debug!(prompt = %self.prompt, "confirmation cancelled");
                None
            }
        }
    }
}
