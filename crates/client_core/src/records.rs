//! Create/update forms: field-presence validation before anything hits the network.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use shared::domain::{EntityKind, RecordId};
use tracing::{error, info, warn};

use crate::{
    backend::{NotificationKind, Notifier, RecordBackend},
    error::{ClientError, ValidationError},
};

/// Field values of a record form, sent as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordDraft {
    fields: Map<String, Value>,
}

impl RecordDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Checks every required field of `kind`; the error maps field name to message.
pub fn validate_draft(kind: EntityKind, draft: &RecordDraft) -> Result<(), ValidationError> {
    let mut error = ValidationError::default();
    for field in kind.required_fields() {
        if is_blank(draft.get(field)) {
            error.insert(*field, format!("{field} is required"));
        }
    }
    if error.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}

pub struct RecordEditor<T> {
    kind: EntityKind,
    backend: Arc<dyn RecordBackend<T>>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Send + 'static> RecordEditor<T> {
    pub fn new(
        kind: EntityKind,
        backend: Arc<dyn RecordBackend<T>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            kind,
            backend,
            notifier,
        }
    }

    pub async fn create(&self, draft: &RecordDraft) -> Result<T, ClientError> {
        validate_draft(self.kind, draft)?;
        let result = self.backend.create_record(self.kind, draft).await;
        self.report(result, "created")
    }

    pub async fn update(&self, id: RecordId, draft: &RecordDraft) -> Result<T, ClientError> {
        validate_draft(self.kind, draft)?;
        let result = self.backend.update_record(self.kind, id, draft).await;
        self.report(result, "updated")
    }

    fn report(&self, result: Result<T, ClientError>, verb: &str) -> Result<T, ClientError> {
        match &result {
            Ok(_) => {
                info!(kind = %self.kind, verb, "record saved");
                self.notifier
                    .notify(NotificationKind::Success, &format!("Record {verb}"));
            }
            // Field errors go back to the form rather than into a toast.
            Err(ClientError::Validation(err)) => {
                warn!(kind = %self.kind, fields = ?err.fields.keys().collect::<Vec<_>>(), "backend rejected fields");
            }
            Err(err) => {
                error!(kind = %self.kind, error = %err, "record save failed");
                self.notifier.notify(NotificationKind::Error, &err.to_string());
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/records_tests.rs"]
mod tests;
