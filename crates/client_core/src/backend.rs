//! Collaborator seams: everything the core needs from the outside world.

use async_trait::async_trait;
use shared::{
    domain::{EntityKind, FileId, RecordId},
    protocol::{Page, StoredFile},
};
use tracing::{error, info, warn};

use crate::{
    error::{ClientError, FetchError},
    file_ingest::UploadCandidate,
    filters::PageQuery,
    records::RecordDraft,
};

#[async_trait]
pub trait RecordBackend<T>: Send + Sync {
    async fn fetch_page(&self, kind: EntityKind, query: &PageQuery) -> Result<Page<T>, FetchError>;
    /// Fails with [`ClientError::Validation`] when the backend rejects individual fields.
    async fn create_record(&self, kind: EntityKind, data: &RecordDraft) -> Result<T, ClientError>;
    async fn update_record(
        &self,
        kind: EntityKind,
        id: RecordId,
        data: &RecordDraft,
    ) -> Result<T, ClientError>;
    async fn delete_record(&self, kind: EntityKind, id: RecordId) -> Result<(), FetchError>;
}

#[async_trait]
pub trait FileBackend: Send + Sync {
    async fn list_files(&self, parent_id: RecordId) -> Result<Vec<StoredFile>, FetchError>;
    async fn upload_files(
        &self,
        parent_id: RecordId,
        files: &[UploadCandidate],
    ) -> Result<Vec<StoredFile>, FetchError>;
    async fn delete_file(&self, file_id: FileId) -> Result<(), FetchError>;
    /// Returns the ZIP archive of every file attached to `parent_id`.
    async fn download_archive(&self, parent_id: RecordId) -> Result<Vec<u8>, FetchError>;
}

pub trait AuthTokenProvider: Send + Sync {
    fn current_auth_token(&self) -> Option<String>;
}

/// A fixed token, typically read from settings at startup.
pub struct StaticToken(pub Option<String>);

impl AuthTokenProvider for StaticToken {
    fn current_auth_token(&self) -> Option<String> {
        self.0.clone().filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// Fire-and-forget user notification (toast, status line, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Routes notifications into the log when no UI is attached.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => info!(notification = "success", "{message}"),
            NotificationKind::Warning => warn!(notification = "warning", "{message}"),
            NotificationKind::Error => error!(notification = "error", "{message}"),
        }
    }
}
