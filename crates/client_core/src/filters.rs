//! Filter criteria and their translation into backend query parameters.

use std::collections::BTreeMap;

use shared::{domain::EntityKind, protocol::SortDirection};

pub const SEARCH_KEY: &str = "search";
pub const INCLUDE_CANCELLED_KEY: &str = "includeCancelled";

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
    Range { min: Option<f64>, max: Option<f64> },
}

impl FilterValue {
    /// Empty text, `false` and an unbounded range place no constraint.
    pub fn is_constraint(&self) -> bool {
        match self {
            FilterValue::Text(text) => !text.trim().is_empty(),
            FilterValue::Flag(flag) => *flag,
            FilterValue::Range { min, max } => min.is_some() || max.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    values: BTreeMap<String, FilterValue>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.set(key, FilterValue::Text(text.into()));
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, flag: bool) -> Self {
        self.set(key, FilterValue::Flag(flag));
        self
    }

    pub fn with_range(mut self, key: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.set(key, FilterValue::Range { min, max });
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: FilterValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Entries that actually constrain the result set.
    pub fn active_entries(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_constraint())
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Two criteria are equivalent when they constrain the same keys the same way,
    /// whatever placeholder entries either one carries.
    pub fn is_equivalent(&self, other: &FilterCriteria) -> bool {
        self.active_entries().eq(other.active_entries())
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in self.active_entries() {
            match value {
                FilterValue::Text(text) => pairs.push((key.to_string(), text.trim().to_string())),
                FilterValue::Flag(_) => pairs.push((key.to_string(), "true".to_string())),
                FilterValue::Range { min, max } => {
                    if let Some(min) = min {
                        pairs.push((format!("{key}Min"), min.to_string()));
                    }
                    if let Some(max) = max {
                        pairs.push((format!("{key}Max"), max.to_string()));
                    }
                }
            }
        }
        pairs
    }
}

/// The criteria a freshly opened list starts with.
pub fn default_filters(kind: EntityKind) -> FilterCriteria {
    let criteria = FilterCriteria::new().with_text(SEARCH_KEY, "");
    match kind {
        EntityKind::ItemGroup => criteria,
        EntityKind::Vehicle => criteria
            .with_text("status", "")
            .with_flag(INCLUDE_CANCELLED_KEY, false)
            .with_range("year", None, None),
        EntityKind::InventoryItem => criteria
            .with_text("groupId", "")
            .with_range("quantity", None, None),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    criteria: FilterCriteria,
    defaults: FilterCriteria,
}

impl FilterState {
    pub fn new(defaults: FilterCriteria) -> Self {
        Self {
            criteria: defaults.clone(),
            defaults,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn apply(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    pub fn reset(&mut self) {
        self.criteria = self.defaults.clone();
    }

    pub fn has_active_filters(&self) -> bool {
        !self.criteria.is_equivalent(&self.defaults)
    }
}

/// Everything a page fetch needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub criteria: FilterCriteria,
    pub page: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl PageQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
            ("sortBy".to_string(), self.sort_field.clone()),
            (
                "sortDirection".to_string(),
                self.sort_direction.as_str().to_string(),
            ),
        ];
        pairs.extend(self.criteria.to_query_pairs());
        pairs
    }
}
