//! reqwest implementation of the record and file collaborators against the admin REST API.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EntityKind, FileId, RecordId},
    error::ApiError,
    protocol::{Page, StoredFile},
};
use tracing::debug;

use crate::{
    backend::{AuthTokenProvider, FileBackend, RecordBackend, StaticToken},
    config::{validate_base_url, ClientSettings},
    error::{ClientError, FetchError, ValidationError},
    file_ingest::{UploadCandidate, MAX_UPLOAD_BYTES},
    filters::PageQuery,
    records::RecordDraft,
};

/// A non-2xx response, with the backend's error body when it sent one.
struct ApiFailure {
    status: StatusCode,
    body: Option<ApiError>,
}

impl ApiFailure {
    fn into_fetch_error(self) -> FetchError {
        let message = self
            .body
            .map(|body| body.message)
            .or_else(|| self.status.canonical_reason().map(str::to_string));
        FetchError::with_status(self.status.as_u16(), message)
    }

    fn into_client_error(self) -> ClientError {
        let field_errors = self
            .body
            .as_ref()
            .filter(|body| !body.fields.is_empty())
            .map(|body| body.fields.clone());
        match field_errors {
            Some(fields) if self.status == StatusCode::UNPROCESSABLE_ENTITY => {
                ValidationError { fields }.into()
            }
            _ => self.into_fetch_error().into(),
        }
    }
}

pub struct HttpBackend {
    http: Client,
    base_url: String,
    auth: Arc<dyn AuthTokenProvider>,
    max_upload_bytes: u64,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthTokenProvider>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let base_url = validate_base_url(&settings.api_base_url)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            auth: Arc::new(StaticToken(settings.api_token.clone())),
            max_upload_bytes: settings.max_upload_bytes,
        })
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Direct download link of a single file's content.
    pub fn content_url(&self, file_id: FileId) -> String {
        format!("{}/files/{}/content", self.base_url, file_id.0)
    }

    fn collection_url(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.path_segment())
    }

    fn files_url(&self, parent_id: RecordId) -> String {
        format!("{}/items/{}/files", self.base_url, parent_id.0)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        self.send_checked(request)
            .await?
            .map_err(ApiFailure::into_fetch_error)
    }

    /// Transport errors are returned as the outer error; HTTP error statuses as the
    /// inner one, so callers can decode them differently.
    async fn send_checked(
        &self,
        request: RequestBuilder,
    ) -> Result<Result<Response, ApiFailure>, FetchError> {
        let request = match self.auth.current_auth_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response));
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "backend returned error status");
        Ok(Err(ApiFailure {
            status,
            body: serde_json::from_str(&body).ok(),
        }))
    }

    async fn save_record<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        match self.send_checked(request).await? {
            Ok(response) => Ok(response.json().await.map_err(FetchError::from)?),
            Err(failure) => Err(failure.into_client_error()),
        }
    }
}

#[async_trait]
impl<T> RecordBackend<T> for HttpBackend
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, kind: EntityKind, query: &PageQuery) -> Result<Page<T>, FetchError> {
        let request = self
            .http
            .get(self.collection_url(kind))
            .query(&query.to_query_pairs());
        Ok(self.send(request).await?.json().await?)
    }

    async fn create_record(&self, kind: EntityKind, data: &RecordDraft) -> Result<T, ClientError> {
        self.save_record(self.http.post(self.collection_url(kind)).json(data))
            .await
    }

    async fn update_record(
        &self,
        kind: EntityKind,
        id: RecordId,
        data: &RecordDraft,
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.collection_url(kind), id.0);
        self.save_record(self.http.put(url).json(data)).await
    }

    async fn delete_record(&self, kind: EntityKind, id: RecordId) -> Result<(), FetchError> {
        let url = format!("{}/{}", self.collection_url(kind), id.0);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl FileBackend for HttpBackend {
    async fn list_files(&self, parent_id: RecordId) -> Result<Vec<StoredFile>, FetchError> {
        let request = self.http.get(self.files_url(parent_id));
        Ok(self.send(request).await?.json().await?)
    }

    async fn upload_files(
        &self,
        parent_id: RecordId,
        files: &[UploadCandidate],
    ) -> Result<Vec<StoredFile>, FetchError> {
        let mut form = Form::new();
        for file in files {
            if file.size() > self.max_upload_bytes {
                return Err(FetchError::new(format!(
                    "{} exceeds the upload limit of {} bytes",
                    file.name, self.max_upload_bytes
                )));
            }
            let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            form = form.part("files", part);
        }
        let request = self.http.post(self.files_url(parent_id)).multipart(form);
        Ok(self.send(request).await?.json().await?)
    }

    async fn delete_file(&self, file_id: FileId) -> Result<(), FetchError> {
        let url = format!("{}/files/{}", self.base_url, file_id.0);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn download_archive(&self, parent_id: RecordId) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/archive", self.files_url(parent_id));
        let bytes = self.send(self.http.get(url)).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
