use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FileId;

/// `max(1, ceil(total_count / page_size))`. A zero page size is treated as one.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One bounded slice of a backend-paginated result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub page_size: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, current_page: u32, total_count: u64, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_count, page_size);
        let current_page = current_page.clamp(1, total_pages);
        Self {
            items,
            current_page,
            total_pages,
            total_count,
            page_size,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), 1, 0, page_size)
    }

    /// Recomputes the derived fields from `total_count` and `page_size`, so the
    /// page invariants hold regardless of what the backend reported for them.
    pub fn normalized(self) -> Self {
        Self::new(self.items, self.current_page, self.total_count, self.page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A binary attachment owned by the backend and associated with a parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: FileId,
    pub file_name: String,
    pub file_extension: String,
    pub file_size_bytes: u64,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub is_previewable: bool,
}
