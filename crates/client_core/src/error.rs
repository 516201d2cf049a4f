//! Error taxonomy of the collection core.

use std::collections::BTreeMap;

use thiserror::Error;

/// A failed network call. `message` carries the human-readable text supplied by
/// the collaborator, when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("request failed"))]
pub struct FetchError {
    pub message: Option<String>,
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: Option<String>) -> Self {
        Self {
            message,
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: Some(err.to_string()),
            status: err.status().map(|status| status.as_u16()),
        }
    }
}

/// Client-side field-level validation failure. Never reaches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed for {}", .fields.keys().cloned().collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }
}

/// A file selection in which nothing passed the extension allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("none of the {rejected} selected file(s) has an accepted extension ({allowed})")]
pub struct RejectedInputError {
    pub rejected: usize,
    pub allowed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    RejectedInput(#[from] RejectedInputError),
    #[error("{failed} of {attempted} deletions failed")]
    BulkDelete { attempted: usize, failed: usize },
    #[error("{0} is already in progress")]
    Busy(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_kept_alongside_message() {
        let err = FetchError::with_status(503, Some("maintenance".into()));
        assert_eq!(err.status, Some(503));
        assert_eq!(err.to_string(), "maintenance");

        let bare = FetchError::with_status(500, None);
        assert_eq!(bare.status, Some(500));
        assert_eq!(bare.to_string(), "request failed");
    }
}
