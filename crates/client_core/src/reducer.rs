//! Reducer over the composed view state of a list: `(state, action) -> state`.

use crate::{
    filters::{FilterCriteria, FilterState, PageQuery},
    pagination::Pager,
    selection::{SelectionScope, SelectionSet},
    sort::SortState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<Id: Ord> {
    pub filters: FilterState,
    pub sort: SortState,
    pub pager: Pager,
    pub selection: SelectionSet<Id>,
    pub scope: SelectionScope,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction<Id> {
    ApplyFilters(FilterCriteria),
    ResetFilters,
    GoToPage(u32),
    NextPage,
    PreviousPage,
    ToggleSort(String),
    /// Replaces the active sort outright, e.g. from a command-line flag.
    SetSort(SortState),
    ToggleSelect(Id),
    SelectAllVisible(Vec<Id>),
    ClearSelection,
    /// A fetched page reported where it sits in the result set.
    PageLoaded { current_page: u32, total_pages: u32 },
}

impl<Id> ViewAction<Id> {
    /// Filter submissions always warrant a fetch, even when nothing changed.
    pub fn forces_fetch(&self) -> bool {
        matches!(self, ViewAction::ApplyFilters(_) | ViewAction::ResetFilters)
    }
}

impl<Id: Ord + Clone> ViewState<Id> {
    pub fn new(filters: FilterState, sort: SortState, page_size: u32, scope: SelectionScope) -> Self {
        Self {
            filters,
            sort,
            pager: Pager::default(),
            selection: SelectionSet::new(),
            scope,
            page_size: page_size.max(1),
        }
    }

    pub fn query(&self) -> PageQuery {
        PageQuery {
            criteria: self.filters.criteria().clone(),
            page: self.pager.current_page(),
            page_size: self.page_size,
            sort_field: self.sort.field.clone(),
            sort_direction: self.sort.direction,
        }
    }
}

pub fn reduce<Id: Ord + Clone>(mut state: ViewState<Id>, action: ViewAction<Id>) -> ViewState<Id> {
    let query_before = state.query();

    match action {
        ViewAction::ApplyFilters(criteria) => {
            state.filters.apply(criteria);
            state.pager.reset();
        }
        ViewAction::ResetFilters => {
            state.filters.reset();
            state.pager.reset();
        }
        ViewAction::GoToPage(page) => {
            state.pager.go_to_page(page);
        }
        ViewAction::NextPage => {
            state.pager.next();
        }
        ViewAction::PreviousPage => {
            state.pager.previous();
        }
        ViewAction::ToggleSort(field) => state.sort.toggle(&field),
        ViewAction::SetSort(sort) => state.sort = sort,
        ViewAction::ToggleSelect(id) => state.selection.toggle(id),
        ViewAction::SelectAllVisible(ids) => state.selection.select_all_visible(ids),
        ViewAction::ClearSelection => state.selection.clear(),
        ViewAction::PageLoaded {
            current_page,
            total_pages,
        } => {
            state.pager = Pager::new(current_page, total_pages);
        }
    }

    // Page-scoped selections must not reference ids that are no longer on screen.
    if state.scope == SelectionScope::Page && state.query() != query_before {
        state.selection.clear();
    }

    state
}
