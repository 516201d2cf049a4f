//! Multi-select state over the identifiers of the visible entities.

use std::collections::BTreeSet;

/// Whether a selection stays valid only for the visible page or across the whole
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionScope {
    #[default]
    Page,
    Global,
}

/// Selected identifiers. Nothing is validated against a backing store: the set holds
/// exactly what callers put in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<Id: Ord> {
    selected: BTreeSet<Id>,
}

impl<Id: Ord> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }
}

impl<Id: Ord + Clone> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: Id) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select-all checkbox semantics: clears when everything visible is already
    /// selected, otherwise selects exactly the visible ids.
    pub fn select_all_visible<I>(&mut self, visible_ids: I)
    where
        I: IntoIterator<Item = Id>,
    {
        let visible: BTreeSet<Id> = visible_ids.into_iter().collect();
        if !visible.is_empty() && self.selected == visible {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.selected.contains(id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_all_selected(&self, visible_count: usize) -> bool {
        let count = self.count();
        count > 0 && count == visible_count
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> Vec<Id> {
        self.selected.iter().cloned().collect()
    }

    pub fn summary(&self, visible_count: usize) -> SelectionSummary<Id> {
        SelectionSummary {
            ids: self.ids(),
            count: self.count(),
            is_all_selected: self.is_all_selected(visible_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary<Id> {
    pub ids: Vec<Id>,
    pub count: usize,
    pub is_all_selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionSet::new();
        selection.toggle(3);
        selection.toggle(5);
        assert_eq!(selection.ids(), vec![3, 5]);
        selection.toggle(3);
        assert_eq!(selection.ids(), vec![5]);
    }

    #[test]
    fn select_all_visible_twice_restores_empty_selection() {
        let mut selection = SelectionSet::new();
        selection.select_all_visible([1, 2, 3]);
        assert!(selection.is_all_selected(3));
        selection.select_all_visible([1, 2, 3]);
        assert!(selection.is_empty());
    }

    #[test]
    fn select_all_visible_replaces_partial_selection() {
        let mut selection = SelectionSet::new();
        selection.toggle(9);
        selection.toggle(1);
        selection.select_all_visible([1, 2]);
        assert_eq!(selection.ids(), vec![1, 2]);
    }

    #[test]
    fn empty_selection_is_never_all_selected() {
        let selection: SelectionSet<i64> = SelectionSet::new();
        assert!(!selection.is_all_selected(0));
        assert_eq!(
            selection.summary(4),
            SelectionSummary {
                ids: Vec::new(),
                count: 0,
                is_all_selected: false
            }
        );
    }

    #[test]
    fn ids_outside_visible_set_are_kept_as_given() {
        let mut selection = SelectionSet::new();
        selection.toggle(42);
        assert!(selection.contains(&42));
        assert!(!selection.is_all_selected(3));
    }
}
