//! Hand-written collaborator fakes shared by the unit tests.

use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex as StdMutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{EntityKind, FileId, Identified, ItemGroup, RecordId},
    protocol::{Page, StoredFile},
};
use tokio::sync::Mutex;

use crate::{
    backend::{FileBackend, NotificationKind, Notifier, RecordBackend},
    error::{ClientError, FetchError},
    file_ingest::UploadCandidate,
    filters::PageQuery,
    pagination::page_slice,
    records::RecordDraft,
};

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: StdMutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<(NotificationKind, String)> {
        self.events.lock().expect("notifier lock").clone()
    }

    pub(crate) fn kinds(&self) -> Vec<NotificationKind> {
        self.events().into_iter().map(|(kind, _)| kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.events
            .lock()
            .expect("notifier lock")
            .push((kind, message.to_string()));
    }
}

pub(crate) fn item_group(id: i64) -> ItemGroup {
    ItemGroup {
        id: RecordId(id),
        name: format!("group-{id}"),
        description: None,
        item_count: 0,
    }
}

pub(crate) fn stored_file(id: i64, name: &str) -> StoredFile {
    let extension = name
        .rfind('.')
        .map(|idx| name[idx..].to_string())
        .unwrap_or_default();
    StoredFile {
        id: FileId(id),
        file_name: name.to_string(),
        file_extension: extension,
        file_size_bytes: 2048,
        file_type: "application/octet-stream".into(),
        uploaded_at: Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap(),
        is_previewable: name.ends_with(".pdf"),
    }
}

/// How the next `fetch_page` call behaves before falling back to paging `records`.
#[derive(Default)]
pub(crate) struct ScriptedFetch {
    pub(crate) delay: Option<Duration>,
    pub(crate) fail: Option<FetchError>,
}

/// Serves pages out of an in-memory record list.
pub(crate) struct FakeRecordBackend<T> {
    pub(crate) records: Mutex<Vec<T>>,
    pub(crate) scripted: Mutex<VecDeque<ScriptedFetch>>,
    pub(crate) queries: Mutex<Vec<PageQuery>>,
    pub(crate) deletes: Mutex<Vec<RecordId>>,
    pub(crate) delete_failures: HashSet<RecordId>,
    pub(crate) saved: Mutex<Vec<RecordDraft>>,
    pub(crate) save_error: Option<ClientError>,
}

impl<T> FakeRecordBackend<T> {
    pub(crate) fn with_records(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
            scripted: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            delete_failures: HashSet::new(),
            saved: Mutex::new(Vec::new()),
            save_error: None,
        }
    }

    pub(crate) fn failing_deletes(mut self, ids: &[i64]) -> Self {
        self.delete_failures = ids.iter().map(|id| RecordId(*id)).collect();
        self
    }

    pub(crate) fn failing_saves(mut self, err: ClientError) -> Self {
        self.save_error = Some(err);
        self
    }

    pub(crate) async fn script(&self, fetch: ScriptedFetch) {
        self.scripted.lock().await.push_back(fetch);
    }

    pub(crate) async fn fetch_count(&self) -> usize {
        self.queries.lock().await.len()
    }
}

#[async_trait]
impl<T> RecordBackend<T> for FakeRecordBackend<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, _kind: EntityKind, query: &PageQuery) -> Result<Page<T>, FetchError> {
        self.queries.lock().await.push(query.clone());
        let scripted = self.scripted.lock().await.pop_front().unwrap_or_default();
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = scripted.fail {
            return Err(err);
        }
        let records = self.records.lock().await;
        let items = page_slice(&records, query.page, query.page_size).to_vec();
        Ok(Page::new(
            items,
            query.page,
            records.len() as u64,
            query.page_size,
        ))
    }

    async fn create_record(&self, _kind: EntityKind, data: &RecordDraft) -> Result<T, ClientError> {
        if let Some(err) = &self.save_error {
            return Err(err.clone());
        }
        self.saved.lock().await.push(data.clone());
        let records = self.records.lock().await;
        records
            .first()
            .cloned()
            .ok_or_else(|| FetchError::new("nothing to echo").into())
    }

    async fn update_record(
        &self,
        kind: EntityKind,
        _id: RecordId,
        data: &RecordDraft,
    ) -> Result<T, ClientError> {
        self.create_record(kind, data).await
    }

    async fn delete_record(&self, _kind: EntityKind, id: RecordId) -> Result<(), FetchError> {
        self.deletes.lock().await.push(id);
        if self.delete_failures.contains(&id) {
            return Err(FetchError::with_status(500, Some(format!("cannot delete {id}"))));
        }
        self.records
            .lock()
            .await
            .retain(|record| record.record_id() != id);
        Ok(())
    }
}

pub(crate) struct FakeFileBackend {
    pub(crate) files: Mutex<Vec<StoredFile>>,
    pub(crate) next_id: Mutex<i64>,
    pub(crate) uploads: Mutex<Vec<Vec<String>>>,
    pub(crate) delete_failures: HashSet<FileId>,
    pub(crate) list_error: Mutex<Option<FetchError>>,
    pub(crate) upload_error: Option<FetchError>,
    pub(crate) archive_delay: Option<Duration>,
    pub(crate) archive_error: Option<FetchError>,
    pub(crate) archive_calls: Mutex<usize>,
}

impl FakeFileBackend {
    pub(crate) fn with_files(files: Vec<StoredFile>) -> Self {
        let next_id = files.iter().map(|file| file.id.0).max().unwrap_or(0) + 1;
        Self {
            files: Mutex::new(files),
            next_id: Mutex::new(next_id),
            uploads: Mutex::new(Vec::new()),
            delete_failures: HashSet::new(),
            list_error: Mutex::new(None),
            upload_error: None,
            archive_delay: None,
            archive_error: None,
            archive_calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl FileBackend for FakeFileBackend {
    async fn list_files(&self, _parent_id: RecordId) -> Result<Vec<StoredFile>, FetchError> {
        if let Some(err) = self.list_error.lock().await.clone() {
            return Err(err);
        }
        Ok(self.files.lock().await.clone())
    }

    async fn upload_files(
        &self,
        _parent_id: RecordId,
        files: &[UploadCandidate],
    ) -> Result<Vec<StoredFile>, FetchError> {
        self.uploads
            .lock()
            .await
            .push(files.iter().map(|file| file.name.clone()).collect());
        if let Some(err) = &self.upload_error {
            return Err(err.clone());
        }
        let mut next_id = self.next_id.lock().await;
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(stored_file(*next_id, &file.name));
            *next_id += 1;
        }
        self.files.lock().await.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn delete_file(&self, file_id: FileId) -> Result<(), FetchError> {
        if self.delete_failures.contains(&file_id) {
            return Err(FetchError::new(format!("file {file_id} is locked")));
        }
        self.files.lock().await.retain(|file| file.id != file_id);
        Ok(())
    }

    async fn download_archive(&self, parent_id: RecordId) -> Result<Vec<u8>, FetchError> {
        *self.archive_calls.lock().await += 1;
        if let Some(delay) = self.archive_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.archive_error {
            return Err(err.clone());
        }
        Ok(format!("PK-archive-{parent_id}").into_bytes())
    }
}
