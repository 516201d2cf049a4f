use super::*;

use std::{sync::Mutex as StdMutex, time::Duration};

use shared::{domain::ItemGroup, protocol::SortDirection};

use crate::{
    confirm::Decision,
    filters::SEARCH_KEY,
    test_support::{item_group, FakeRecordBackend, RecordingNotifier, ScriptedFetch},
};

struct Harness {
    backend: Arc<FakeRecordBackend<ItemGroup>>,
    notifier: Arc<RecordingNotifier>,
    controller: CollectionController<ItemGroup>,
    hook_calls: Arc<StdMutex<Vec<PageQuery>>>,
}

fn harness_with(backend: FakeRecordBackend<ItemGroup>) -> Harness {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::default());
    let hook_calls = Arc::new(StdMutex::new(Vec::new()));
    let recorded = Arc::clone(&hook_calls);
    let controller = CollectionController::new(
        EntityKind::ItemGroup,
        backend.clone() as Arc<dyn RecordBackend<ItemGroup>>,
        notifier.clone() as Arc<dyn Notifier>,
        10,
    )
    .with_state_change_hook(Box::new(move |query: &PageQuery| {
        recorded.lock().expect("hook lock").push(query.clone());
    }));
    Harness {
        backend,
        notifier,
        controller,
        hook_calls,
    }
}

fn harness(records: usize) -> Harness {
    harness_with(FakeRecordBackend::with_records(
        (1..=records as i64).map(item_group).collect(),
    ))
}

fn ids(ids: &[i64]) -> Vec<RecordId> {
    ids.iter().map(|id| RecordId(*id)).collect()
}

#[tokio::test]
async fn first_fetch_populates_page_and_window() {
    let h = harness(23);
    let outcome = h.controller.refresh().await.expect("fetch");
    assert_eq!(outcome, FetchOutcome::Applied);

    let snap = h.controller.snapshot().await;
    assert!(snap.has_loaded);
    assert_eq!(snap.page.total_pages, 3);
    assert_eq!(snap.page.items.len(), 10);
    assert_eq!(
        snap.window,
        vec![PageMarker::Page(1), PageMarker::Page(2), PageMarker::Page(3)]
    );
    assert!(snap.show_pagination);
    assert!(!snap.is_empty);
    assert_eq!(snap.phase, FetchPhase::Idle);
    assert_eq!(snap.sort, SortState::ascending("name"));
}

#[tokio::test]
async fn first_fetch_failure_yields_empty_error_state() {
    let h = harness(5);
    h.backend
        .script(ScriptedFetch {
            fail: Some(FetchError::new("backend offline")),
            ..Default::default()
        })
        .await;

    let err = h.controller.refresh().await.expect_err("must fail");
    assert_eq!(err.to_string(), "backend offline");

    let snap = h.controller.snapshot().await;
    assert!(!snap.has_loaded);
    assert!(snap.is_empty);
    assert_eq!(snap.error.as_deref(), Some("backend offline"));
    assert!(h.notifier.events().is_empty(), "read errors stay inline");
}

#[tokio::test]
async fn failed_refresh_keeps_previously_displayed_page() {
    let h = harness(15);
    h.controller.refresh().await.expect("fetch");
    h.backend
        .script(ScriptedFetch {
            fail: Some(FetchError::new("timeout")),
            ..Default::default()
        })
        .await;
    h.controller.refresh().await.expect_err("must fail");

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.page.items.len(), 10);
    assert_eq!(snap.error.as_deref(), Some("timeout"));

    h.controller.refresh().await.expect("fetch");
    assert_eq!(h.controller.snapshot().await.error, None);
}

#[tokio::test]
async fn apply_filters_resets_to_first_page_and_notifies_hook() {
    let h = harness(40);
    h.controller.refresh().await.expect("fetch");
    let query = h.controller.go_to_page(3).await;
    assert_eq!(query.page, 3);

    let unchanged = h.controller.query().await.criteria;
    let query = h.controller.apply_filters(unchanged).await;
    assert_eq!(query.page, 1);

    let calls = h.hook_calls.lock().expect("hook lock").clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].page, 1);
}

#[tokio::test]
async fn out_of_range_navigation_is_silent() {
    let h = harness(23);
    h.controller.refresh().await.expect("fetch");
    let query = h.controller.go_to_page(9).await;
    assert_eq!(query.page, 1);
    let query = h.controller.previous_page().await;
    assert_eq!(query.page, 1);
    assert!(h.hook_calls.lock().expect("hook lock").is_empty());
}

#[tokio::test]
async fn toggle_sort_flips_and_resets_direction() {
    let h = harness(3);
    let query = h.controller.toggle_sort("name").await;
    assert_eq!(query.sort_direction, SortDirection::Desc);
    let query = h.controller.toggle_sort("itemCount").await;
    assert_eq!(query.sort_field, "itemCount");
    assert_eq!(query.sort_direction, SortDirection::Asc);
}

#[tokio::test]
async fn active_filters_are_reported_until_reset() {
    let h = harness(3);
    h.controller
        .apply_filters(default_filters(EntityKind::ItemGroup).with_text(SEARCH_KEY, "bolts"))
        .await;
    assert!(h.controller.snapshot().await.has_active_filters);

    h.controller.reset_filters().await;
    assert!(!h.controller.snapshot().await.has_active_filters);
}

#[tokio::test]
async fn superseded_response_does_not_overwrite_newer_page() {
    let h = harness(30);
    h.controller.refresh().await.expect("fetch");

    h.backend
        .script(ScriptedFetch {
            delay: Some(Duration::from_millis(60)),
            ..Default::default()
        })
        .await;
    h.backend.script(ScriptedFetch::default()).await;

    // The slow request is issued for page 1, the fast one after moving to page 2.
    let slow = h.controller.refresh();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        h.controller.go_to_page(2).await;
        h.controller.refresh().await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.expect("slow"), FetchOutcome::Superseded);
    assert_eq!(fast.expect("fast"), FetchOutcome::Applied);

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.page.current_page, 2);
    assert_eq!(snap.page.items[0].id, RecordId(11));
    assert_eq!(snap.phase, FetchPhase::Idle);
}

#[tokio::test]
async fn navigation_during_fetch_drops_the_stale_response() {
    let h = harness(30);
    h.controller.refresh().await.expect("fetch");
    h.backend
        .script(ScriptedFetch {
            delay: Some(Duration::from_millis(60)),
            ..Default::default()
        })
        .await;

    let slow = h.controller.refresh();
    let navigate = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        h.controller.go_to_page(3).await
    };
    let (slow, navigated) = tokio::join!(slow, navigate);

    assert_eq!(navigated.page, 3);
    assert_eq!(slow.expect("slow"), FetchOutcome::Superseded);

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.query.page, 3);
    assert_eq!(snap.page.current_page, 1);
    assert_eq!(snap.phase, FetchPhase::Idle);

    assert_eq!(h.controller.refresh().await.expect("fetch"), FetchOutcome::Applied);
    let snap = h.controller.snapshot().await;
    assert_eq!(snap.page.current_page, 3);
    assert_eq!(snap.page.items[0].id, RecordId(21));
}

#[tokio::test]
async fn filter_change_during_fetch_keeps_selection_and_new_query() {
    let h = harness(30);
    let controller = h.controller.with_selection_scope(SelectionScope::Global);
    controller.refresh().await.expect("fetch");
    controller.toggle_select(RecordId(2)).await;
    h.backend
        .script(ScriptedFetch {
            delay: Some(Duration::from_millis(60)),
            ..Default::default()
        })
        .await;

    let slow = controller.refresh();
    let filter = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        controller
            .apply_filters(default_filters(EntityKind::ItemGroup).with_text(SEARCH_KEY, "bolts"))
            .await
    };
    let (slow, _) = tokio::join!(slow, filter);

    assert_eq!(slow.expect("slow"), FetchOutcome::Superseded);
    let snap = controller.snapshot().await;
    assert!(snap.has_active_filters);
    assert_eq!(snap.selection.ids, ids(&[2]));
}

#[tokio::test]
async fn set_sort_applies_field_and_direction_as_given() {
    let h = harness(3);
    let query = h.controller.set_sort(SortState::ascending("name")).await;
    assert_eq!(query.sort_field, "name");
    assert_eq!(query.sort_direction, SortDirection::Asc);

    let query = h
        .controller
        .set_sort(SortState {
            field: "itemCount".into(),
            direction: SortDirection::Desc,
        })
        .await;
    assert_eq!(query.sort_field, "itemCount");
    assert_eq!(query.sort_direction, SortDirection::Desc);
}

#[tokio::test]
async fn select_all_visible_uses_current_page_and_clears_on_navigation() {
    let h = harness(23);
    h.controller.refresh().await.expect("fetch");

    h.controller.select_all_visible().await;
    let snap = h.controller.snapshot().await;
    assert_eq!(snap.selection.count, 10);
    assert!(snap.selection.is_all_selected);

    h.controller.next_page().await;
    assert_eq!(h.controller.snapshot().await.selection.count, 0);
}

#[tokio::test]
async fn global_scope_keeps_selection_across_pages() {
    let h = harness(23);
    let controller = h.controller.with_selection_scope(SelectionScope::Global);
    controller.refresh().await.expect("fetch");
    controller.toggle_select(RecordId(4)).await;
    controller.next_page().await;
    assert_eq!(controller.snapshot().await.selection.ids, ids(&[4]));
}

#[tokio::test]
async fn bulk_delete_with_one_failure_reports_whole_batch_failed() {
    let h = harness_with(
        FakeRecordBackend::with_records((1..=5).map(item_group).collect()).failing_deletes(&[2]),
    );
    h.controller.refresh().await.expect("fetch");
    for id in [1, 2, 3] {
        h.controller.toggle_select(RecordId(id)).await;
    }
    let fetches_before = h.backend.fetch_count().await;

    let pending = h.controller.request_bulk_delete().await.expect("selection");
    let batch = pending.resolve(Decision::Confirmed).expect("confirmed");
    let err = h.controller.bulk_delete(batch).await.expect_err("must fail");

    assert_eq!(
        err,
        ClientError::BulkDelete {
            attempted: 3,
            failed: 1
        }
    );
    let mut deleted = h.backend.deletes.lock().await.clone();
    deleted.sort();
    assert_eq!(deleted, ids(&[1, 2, 3]));
    assert_eq!(h.backend.fetch_count().await, fetches_before + 1);

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.selection.count, 0);
    // Ids 1 and 3 were removed by the backend despite the reported failure.
    let visible: Vec<RecordId> = snap.page.items.iter().map(|g| g.id).collect();
    assert_eq!(visible, ids(&[2, 4, 5]));
    assert_eq!(h.notifier.kinds(), vec![NotificationKind::Error]);
}

#[tokio::test]
async fn bulk_delete_success_refreshes_and_notifies_once() {
    let h = harness(4);
    h.controller.refresh().await.expect("fetch");
    let deleted = h.controller.bulk_delete(ids(&[1, 4])).await.expect("delete");
    assert_eq!(deleted, 2);

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.page.total_count, 2);
    assert_eq!(
        h.notifier.events(),
        vec![(NotificationKind::Success, "Deleted 2 record(s)".to_string())]
    );
}

#[tokio::test]
async fn bulk_delete_request_needs_a_selection_and_can_be_cancelled() {
    let h = harness(4);
    h.controller.refresh().await.expect("fetch");
    assert!(h.controller.request_bulk_delete().await.is_none());

    h.controller.toggle_select(RecordId(2)).await;
    let pending = h.controller.request_bulk_delete().await.expect("selection");
    assert_eq!(pending.prompt(), "Delete 1 selected record(s)?");
    assert!(pending.resolve(Decision::Cancelled).is_none());
    assert!(h.backend.deletes.lock().await.is_empty());
}

#[tokio::test]
async fn single_delete_failure_notifies_and_still_refreshes() {
    let h = harness_with(
        FakeRecordBackend::with_records((1..=3).map(item_group).collect()).failing_deletes(&[3]),
    );
    h.controller.refresh().await.expect("fetch");
    let fetches_before = h.backend.fetch_count().await;

    let err = h.controller.delete_record(RecordId(3)).await.expect_err("must fail");
    assert!(matches!(err, ClientError::Fetch(_)));
    assert_eq!(h.backend.fetch_count().await, fetches_before + 1);
    assert_eq!(h.notifier.kinds(), vec![NotificationKind::Error]);
}
