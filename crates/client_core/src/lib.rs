//! Client-side collection management for the admin backend: paginated, filterable,
//! sortable record lists with selection and batch deletes, and the attachment
//! pipeline of a single record.

pub mod backend;
pub mod collection;
pub mod config;
pub mod confirm;
pub mod error;
pub mod file_ingest;
pub mod filters;
pub mod http;
pub mod pagination;
pub mod presentation;
pub mod records;
pub mod reducer;
pub mod selection;
pub mod sort;

pub use backend::{
    AuthTokenProvider, FileBackend, NotificationKind, Notifier, RecordBackend, StaticToken,
    TracingNotifier,
};
pub use collection::{CollectionController, CollectionSnapshot, FetchOutcome, FetchPhase};
pub use config::{load_settings, ClientSettings};
pub use confirm::{Decision, PendingConfirmation};
pub use error::{ClientError, FetchError, RejectedInputError, ValidationError};
pub use file_ingest::{
    ArchivePayload, DragEvent, DragState, FileIngestPipeline, FileListSnapshot, UploadCandidate,
};
pub use filters::{FilterCriteria, FilterValue, PageQuery};
pub use http::HttpBackend;
pub use records::{RecordDraft, RecordEditor};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
