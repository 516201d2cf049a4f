//! Attachment manager of one parent record: drag-and-drop ingestion, extension
//! filtering, a locally paginated file list with batch delete, and ZIP download.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::join_all;
use shared::domain::{FileId, RecordId};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    backend::{FileBackend, NotificationKind, Notifier},
    confirm::PendingConfirmation,
    error::{ClientError, FetchError, RejectedInputError},
    pagination::{page_slice, total_pages, PageMarker, Pager},
    presentation::FileEntry,
    selection::{SelectionScope, SelectionSet, SelectionSummary},
};

/// Matched against the end of the lowercased file name.
pub const ACCEPTED_EXTENSIONS: [&str; 6] = [".esp", ".nc", ".pdf", ".x_t", ".xlsx", ".xls"];

/// Upper bound per file, enforced by the upload collaborator.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A file picked or dropped by the user, before it has been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    /// Lowercased, including the leading dot; empty when the name has none.
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let extension = name
            .rfind('.')
            .map(|idx| name[idx..].to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            name,
            extension,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_accepted(&self) -> bool {
        is_accepted_name(&self.name)
    }
}

pub fn is_accepted_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Keeps the accepted subset. Rejected files in a mixed batch are dropped without
/// comment; a batch with nothing acceptable is an error.
pub fn filter_accepted(
    candidates: Vec<UploadCandidate>,
) -> Result<Vec<UploadCandidate>, RejectedInputError> {
    let total = candidates.len();
    let accepted: Vec<_> = candidates
        .into_iter()
        .filter(UploadCandidate::is_accepted)
        .collect();
    if accepted.is_empty() {
        return Err(RejectedInputError {
            rejected: total,
            allowed: ACCEPTED_EXTENSIONS.join(" "),
        });
    }
    if accepted.len() < total {
        debug!(
            accepted = accepted.len(),
            dropped = total - accepted.len(),
            "dropping files with unsupported extensions"
        );
    }
    Ok(accepted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<UploadCandidate>),
}

impl DragState {
    /// Advances the drag state machine, returning the dropped files on `Drop`.
    pub fn on_event(&mut self, event: DragEvent) -> Option<Vec<UploadCandidate>> {
        match event {
            DragEvent::Enter | DragEvent::Over => {
                *self = DragState::Dragging;
                None
            }
            DragEvent::Leave => {
                *self = DragState::Idle;
                None
            }
            DragEvent::Drop(files) => {
                *self = DragState::Idle;
                Some(files)
            }
        }
    }
}

#[derive(Debug)]
pub struct DragResponse {
    /// Drag events never fall through to the browser's default navigation.
    pub suppress_default: bool,
    /// Present when the event was a drop: the outcome of ingesting the dropped files.
    pub upload: Option<Result<Vec<FileId>, ClientError>>,
}

/// A ZIP archive of all files of a parent record, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ArchivePayload {
    pub async fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct FileListSnapshot {
    pub visible: Vec<FileEntry>,
    pub total_files: usize,
    pub current_page: u32,
    pub window: Vec<PageMarker>,
    pub show_pagination: bool,
    pub selection: SelectionSummary<FileId>,
    pub drag: DragState,
    pub uploading: bool,
    pub downloading_zip: bool,
    pub is_empty: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct FileListState {
    files: Vec<FileEntry>,
    pager: Pager,
    selection: SelectionSet<FileId>,
    drag: DragState,
    uploading: bool,
    downloading_zip: bool,
    error: Option<String>,
}

impl FileListState {
    fn visible_ids(&self, page_size: u32) -> Vec<FileId> {
        page_slice(&self.files, self.pager.current_page(), page_size)
            .iter()
            .map(|entry| entry.file.id)
            .collect()
    }

    fn sync_pager(&mut self, page_size: u32) {
        self.pager
            .set_total_pages(total_pages(self.files.len() as u64, page_size));
    }
}

pub struct FileIngestPipeline {
    parent_id: RecordId,
    backend: Arc<dyn FileBackend>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    scope: SelectionScope,
    inner: Mutex<FileListState>,
}

impl FileIngestPipeline {
    pub fn new(
        parent_id: RecordId,
        backend: Arc<dyn FileBackend>,
        notifier: Arc<dyn Notifier>,
        page_size: u32,
    ) -> Self {
        Self {
            parent_id,
            backend,
            notifier,
            page_size: page_size.max(1),
            scope: SelectionScope::Page,
            inner: Mutex::new(FileListState::default()),
        }
    }

    pub fn with_selection_scope(mut self, scope: SelectionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn parent_id(&self) -> RecordId {
        self.parent_id
    }

    /// Replaces the cached list with the backend's. On failure the previous list
    /// stays and the message is kept for inline display.
    pub async fn load(&self) -> Result<usize, FetchError> {
        let result = self.backend.list_files(self.parent_id).await;
        let mut guard = self.inner.lock().await;
        match result {
            Ok(files) => {
                guard.files = files.into_iter().map(FileEntry::from).collect();
                guard.selection.clear();
                guard.error = None;
                guard.sync_pager(self.page_size);
                info!(parent_id = %self.parent_id, count = guard.files.len(), "loaded files");
                Ok(guard.files.len())
            }
            Err(err) => {
                warn!(parent_id = %self.parent_id, error = %err, "file list fetch failed");
                guard.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Validates and uploads a picked or dropped batch, appending the stored files
    /// to the local list.
    pub async fn ingest(&self, candidates: Vec<UploadCandidate>) -> Result<Vec<FileId>, ClientError> {
        let accepted = match filter_accepted(candidates) {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(parent_id = %self.parent_id, rejected = err.rejected, "no acceptable files");
                self.notifier.notify(
                    NotificationKind::Warning,
                    &format!("Only {} files are accepted", err.allowed),
                );
                return Err(err.into());
            }
        };

        {
            let mut guard = self.inner.lock().await;
            if guard.uploading {
                return Err(ClientError::Busy("upload"));
            }
            guard.uploading = true;
        }

        let result = self.backend.upload_files(self.parent_id, &accepted).await;

        let mut guard = self.inner.lock().await;
        guard.uploading = false;
        match result {
            Ok(stored) => {
                let ids: Vec<FileId> = stored.iter().map(|file| file.id).collect();
                guard.files.extend(stored.into_iter().map(FileEntry::from));
                guard.sync_pager(self.page_size);
                info!(parent_id = %self.parent_id, uploaded = ids.len(), "files uploaded");
                self.notifier.notify(
                    NotificationKind::Success,
                    &format!("Uploaded {} file(s)", ids.len()),
                );
                Ok(ids)
            }
            Err(err) => {
                error!(parent_id = %self.parent_id, error = %err, "upload failed");
                self.notifier
                    .notify(NotificationKind::Error, &format!("Upload failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn handle_drag(&self, event: DragEvent) -> DragResponse {
        let dropped = self.inner.lock().await.drag.on_event(event);
        let upload = match dropped {
            Some(files) => Some(self.ingest(files).await),
            None => None,
        };
        DragResponse {
            suppress_default: true,
            upload,
        }
    }

    /// Returns `true` when the page changed. Out-of-range pages are ignored.
    pub async fn go_to_page(&self, page: u32) -> bool {
        let mut guard = self.inner.lock().await;
        let changed = guard.pager.go_to_page(page);
        if changed && self.scope == SelectionScope::Page {
            guard.selection.clear();
        }
        changed
    }

    pub async fn toggle_select(&self, id: FileId) {
        self.inner.lock().await.selection.toggle(id);
    }

    pub async fn select_all_visible(&self) {
        let mut guard = self.inner.lock().await;
        let visible = guard.visible_ids(self.page_size);
        guard.selection.select_all_visible(visible);
    }

    pub async fn clear_selection(&self) {
        self.inner.lock().await.selection.clear();
    }

    pub async fn request_bulk_delete(&self) -> Option<PendingConfirmation<Vec<FileId>>> {
        let ids = self.inner.lock().await.selection.ids();
        if ids.is_empty() {
            return None;
        }
        let prompt = format!("Delete {} selected file(s)?", ids.len());
        Some(PendingConfirmation::new(prompt, ids))
    }

    /// Deletes every id concurrently and drops the deleted entries from the local
    /// list. The batch is reported as failed when any delete fails.
    pub async fn bulk_delete(&self, ids: Vec<FileId>) -> Result<usize, ClientError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let attempted = ids.len();
        let results = join_all(ids.iter().map(|id| self.backend.delete_file(*id))).await;

        let mut deleted = Vec::with_capacity(attempted);
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(()) => deleted.push(*id),
                Err(err) => error!(file_id = %id, error = %err, "file delete failed"),
            }
        }
        let failed = attempted - deleted.len();

        {
            let mut guard = self.inner.lock().await;
            guard.files.retain(|entry| !deleted.contains(&entry.file.id));
            guard.selection.clear();
            guard.sync_pager(self.page_size);
        }

        if failed > 0 {
            self.notifier
                .notify(NotificationKind::Error, "Failed to delete selected files");
            Err(ClientError::BulkDelete { attempted, failed })
        } else {
            info!(parent_id = %self.parent_id, deleted = attempted, "files deleted");
            self.notifier.notify(
                NotificationKind::Success,
                &format!("Deleted {attempted} file(s)"),
            );
            Ok(attempted)
        }
    }

    pub async fn delete_file(&self, id: FileId) -> Result<(), ClientError> {
        self.bulk_delete(vec![id]).await.map(|_| ())
    }

    /// Fetches the ZIP of every attached file. Re-entrant calls are refused while a
    /// download is running; the busy flag is released whatever the outcome.
    pub async fn download_archive(&self) -> Result<ArchivePayload, ClientError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.downloading_zip {
                return Err(ClientError::Busy("archive download"));
            }
            guard.downloading_zip = true;
        }

        let result = self.backend.download_archive(self.parent_id).await;
        self.inner.lock().await.downloading_zip = false;

        match result {
            Ok(bytes) => {
                info!(parent_id = %self.parent_id, size = bytes.len(), "archive downloaded");
                Ok(ArchivePayload {
                    file_name: format!("item-{}-files.zip", self.parent_id),
                    bytes,
                })
            }
            Err(err) => {
                warn!(parent_id = %self.parent_id, error = %err, "archive download failed");
                self.notifier
                    .notify(NotificationKind::Error, "Failed to download files");
                Err(err.into())
            }
        }
    }

    pub async fn snapshot(&self) -> FileListSnapshot {
        let guard = self.inner.lock().await;
        let visible = page_slice(&guard.files, guard.pager.current_page(), self.page_size).to_vec();
        FileListSnapshot {
            selection: guard.selection.summary(visible.len()),
            is_empty: guard.files.is_empty(),
            visible,
            total_files: guard.files.len(),
            current_page: guard.pager.current_page(),
            window: guard.pager.window(),
            show_pagination: guard.pager.show_controls(),
            drag: guard.drag,
            uploading: guard.uploading,
            downloading_zip: guard.downloading_zip,
            error: guard.error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/file_ingest_tests.rs"]
mod tests;
