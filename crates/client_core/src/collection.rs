//! Paginated, filterable, sortable view over one backend collection.

use std::sync::Arc;

use futures::future::join_all;
use shared::{
    domain::{EntityKind, Identified, RecordId},
    protocol::Page,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    backend::{NotificationKind, Notifier, RecordBackend},
    confirm::PendingConfirmation,
    error::{ClientError, FetchError},
    filters::{default_filters, FilterCriteria, FilterState, PageQuery},
    pagination::PageMarker,
    reducer::{reduce, ViewAction, ViewState},
    selection::{SelectionScope, SelectionSummary},
    sort::SortState,
};

pub type StateChangeHook = Box<dyn Fn(&PageQuery) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
}

/// What happened to the response of a [`CollectionController::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request was issued, or the query changed, while this one was in
    /// flight; its result was dropped.
    Superseded,
}

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot<T> {
    pub page: Page<T>,
    pub query: PageQuery,
    pub sort: SortState,
    pub selection: SelectionSummary<RecordId>,
    pub window: Vec<PageMarker>,
    pub show_pagination: bool,
    pub is_empty: bool,
    pub has_active_filters: bool,
    pub has_loaded: bool,
    pub phase: FetchPhase,
    /// Inline message of the last failed fetch, cleared by the next successful one.
    pub error: Option<String>,
}

struct CollectionState<T> {
    view: ViewState<RecordId>,
    page: Option<Page<T>>,
    phase: FetchPhase,
    error: Option<String>,
    issued_seq: u64,
}

pub struct CollectionController<T> {
    kind: EntityKind,
    backend: Arc<dyn RecordBackend<T>>,
    notifier: Arc<dyn Notifier>,
    on_state_change: Option<StateChangeHook>,
    inner: Mutex<CollectionState<T>>,
}

impl<T> CollectionController<T>
where
    T: Identified + Clone + Send + Sync + 'static,
{
    pub fn new(
        kind: EntityKind,
        backend: Arc<dyn RecordBackend<T>>,
        notifier: Arc<dyn Notifier>,
        page_size: u32,
    ) -> Self {
        let view = ViewState::new(
            FilterState::new(default_filters(kind)),
            SortState::ascending(kind.default_sort_field()),
            page_size,
            SelectionScope::Page,
        );
        Self {
            kind,
            backend,
            notifier,
            on_state_change: None,
            inner: Mutex::new(CollectionState {
                view,
                page: None,
                phase: FetchPhase::Idle,
                error: None,
                issued_seq: 0,
            }),
        }
    }

    pub fn with_selection_scope(mut self, scope: SelectionScope) -> Self {
        self.inner.get_mut().view.scope = scope;
        self
    }

    /// Called with the new query after every transition that changes it. The
    /// application decides whether to follow up with [`Self::refresh`].
    pub fn with_state_change_hook(mut self, hook: StateChangeHook) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub async fn query(&self) -> PageQuery {
        self.inner.lock().await.view.query()
    }

    pub async fn dispatch(&self, action: ViewAction<RecordId>) -> PageQuery {
        let forces_fetch = action.forces_fetch();
        let (before, after) = {
            let mut guard = self.inner.lock().await;
            let before = guard.view.query();
            guard.view = reduce(guard.view.clone(), action);
            (before, guard.view.query())
        };

        if forces_fetch || before != after {
            debug!(kind = %self.kind, page = after.page, sort = %after.sort_field, "query changed");
            if let Some(hook) = &self.on_state_change {
                hook(&after);
            }
        }
        after
    }

    pub async fn apply_filters(&self, criteria: FilterCriteria) -> PageQuery {
        self.dispatch(ViewAction::ApplyFilters(criteria)).await
    }

    pub async fn reset_filters(&self) -> PageQuery {
        self.dispatch(ViewAction::ResetFilters).await
    }

    pub async fn go_to_page(&self, page: u32) -> PageQuery {
        self.dispatch(ViewAction::GoToPage(page)).await
    }

    pub async fn next_page(&self) -> PageQuery {
        self.dispatch(ViewAction::NextPage).await
    }

    pub async fn previous_page(&self) -> PageQuery {
        self.dispatch(ViewAction::PreviousPage).await
    }

    pub async fn toggle_sort(&self, field: &str) -> PageQuery {
        self.dispatch(ViewAction::ToggleSort(field.to_string())).await
    }

    pub async fn set_sort(&self, sort: SortState) -> PageQuery {
        self.dispatch(ViewAction::SetSort(sort)).await
    }

    pub async fn toggle_select(&self, id: RecordId) {
        self.dispatch(ViewAction::ToggleSelect(id)).await;
    }

    pub async fn select_all_visible(&self) {
        let visible = {
            let guard = self.inner.lock().await;
            guard
                .page
                .as_ref()
                .map(|page| page.items.iter().map(|item| item.record_id()).collect())
                .unwrap_or_default()
        };
        self.dispatch(ViewAction::SelectAllVisible(visible)).await;
    }

    pub async fn clear_selection(&self) {
        self.dispatch(ViewAction::ClearSelection).await;
    }

    /// Fetches the page for the current query. Each call is tagged with a sequence
    /// number and only the newest one may update the displayed page; a response is
    /// also dropped when the query changed while it was in flight. A failure keeps
    /// the previously displayed page and records the message inline.
    pub async fn refresh(&self) -> Result<FetchOutcome, FetchError> {
        let (seq, query) = {
            let mut guard = self.inner.lock().await;
            guard.issued_seq += 1;
            guard.phase = FetchPhase::Loading;
            (guard.issued_seq, guard.view.query())
        };
        debug!(kind = %self.kind, seq, page = query.page, "fetching page");

        let result = self.backend.fetch_page(self.kind, &query).await;

        let mut guard = self.inner.lock().await;
        if seq != guard.issued_seq {
            warn!(
                kind = %self.kind,
                seq,
                latest = guard.issued_seq,
                "ignoring superseded page response"
            );
            return Ok(FetchOutcome::Superseded);
        }
        guard.phase = FetchPhase::Idle;
        if guard.view.query() != query {
            debug!(kind = %self.kind, seq, "query changed while fetching, dropping response");
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let page = page.normalized();
                info!(
                    kind = %self.kind,
                    page = page.current_page,
                    total_pages = page.total_pages,
                    total_count = page.total_count,
                    "fetched page"
                );
                guard.view = reduce(
                    guard.view.clone(),
                    ViewAction::PageLoaded {
                        current_page: page.current_page,
                        total_pages: page.total_pages,
                    },
                );
                guard.page = Some(page);
                guard.error = None;
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!(kind = %self.kind, error = %err, "page fetch failed");
                guard.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Deletes one record, then re-fetches the current page.
    pub async fn delete_record(&self, id: RecordId) -> Result<(), ClientError> {
        let result = self.backend.delete_record(self.kind, id).await;
        match &result {
            Ok(()) => {
                info!(kind = %self.kind, %id, "record deleted");
                self.notifier
                    .notify(NotificationKind::Success, "Record deleted");
            }
            Err(err) => {
                error!(kind = %self.kind, %id, error = %err, "record delete failed");
                self.notifier
                    .notify(NotificationKind::Error, "Failed to delete record");
            }
        }
        self.refresh_after_mutation().await;
        result.map_err(ClientError::from)
    }

    /// Asks for confirmation before deleting the current selection. `None` when
    /// nothing is selected.
    pub async fn request_bulk_delete(&self) -> Option<PendingConfirmation<Vec<RecordId>>> {
        let ids = self.inner.lock().await.view.selection.ids();
        if ids.is_empty() {
            return None;
        }
        let prompt = format!("Delete {} selected record(s)?", ids.len());
        Some(PendingConfirmation::new(prompt, ids))
    }

    /// Deletes every id concurrently. The batch fails as a whole when any delete
    /// fails; either way the selection is cleared and the page re-fetched.
    pub async fn bulk_delete(&self, ids: Vec<RecordId>) -> Result<usize, ClientError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let attempted = ids.len();
        let results = join_all(
            ids.iter()
                .map(|id| self.backend.delete_record(self.kind, *id)),
        )
        .await;

        let mut failed = 0;
        for (id, result) in ids.iter().zip(&results) {
            if let Err(err) = result {
                failed += 1;
                error!(kind = %self.kind, %id, error = %err, "bulk delete item failed");
            }
        }

        self.clear_selection().await;
        self.refresh_after_mutation().await;

        if failed > 0 {
            self.notifier
                .notify(NotificationKind::Error, "Failed to delete selected records");
            Err(ClientError::BulkDelete { attempted, failed })
        } else {
            info!(kind = %self.kind, attempted, "bulk delete finished");
            self.notifier.notify(
                NotificationKind::Success,
                &format!("Deleted {attempted} record(s)"),
            );
            Ok(attempted)
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(err) = self.refresh().await {
            debug!(kind = %self.kind, error = %err, "refresh after mutation failed");
        }
    }

    pub async fn snapshot(&self) -> CollectionSnapshot<T> {
        let guard = self.inner.lock().await;
        let view = &guard.view;
        let page = guard
            .page
            .clone()
            .unwrap_or_else(|| Page::empty(view.page_size));
        let visible_count = page.items.len();
        CollectionSnapshot {
            is_empty: page.is_empty(),
            page,
            query: view.query(),
            sort: view.sort.clone(),
            selection: view.selection.summary(visible_count),
            window: view.pager.window(),
            show_pagination: view.pager.show_controls(),
            has_active_filters: view.filters.has_active_filters(),
            has_loaded: guard.page.is_some(),
            phase: guard.phase,
            error: guard.error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
