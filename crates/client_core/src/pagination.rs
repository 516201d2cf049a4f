//! Page arithmetic and the compressed page-number window shown under a list.

pub use shared::protocol::total_pages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

/// First page, last page and the neighbours of `current_page`, with every run of
/// two or more omitted pages collapsed into a single [`PageMarker::Ellipsis`].
/// A single omitted page is shown as its number.
pub fn compute_window(current_page: u32, total_pages: u32) -> Vec<PageMarker> {
    let total = total_pages.max(1);
    let current = current_page.clamp(1, total);

    let mut shown = vec![
        1,
        current.saturating_sub(1).max(1),
        current,
        current.saturating_add(1).min(total),
        total,
    ];
    shown.sort_unstable();
    shown.dedup();

    let mut markers = Vec::with_capacity(shown.len() + 2);
    let mut previous: Option<u32> = None;
    for page in shown {
        if let Some(prev) = previous {
            match page - prev - 1 {
                0 => {}
                1 => markers.push(PageMarker::Page(prev + 1)),
                _ => markers.push(PageMarker::Ellipsis),
            }
        }
        markers.push(PageMarker::Page(page));
        previous = Some(page);
    }
    markers
}

/// Cursor over a known number of pages. Requests outside `[1, total_pages]` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    current_page: u32,
    total_pages: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
        }
    }
}

impl Pager {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current_page: current_page.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Pagination controls are only rendered when there is more than one page.
    pub fn show_controls(&self) -> bool {
        self.total_pages > 1
    }

    /// Returns `true` when the current page changed.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Adopts a new page count, clamping the cursor into range.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages.max(1);
        self.current_page = self.current_page.clamp(1, self.total_pages);
    }

    pub fn window(&self) -> Vec<PageMarker> {
        compute_window(self.current_page, self.total_pages)
    }
}

/// The items of 1-based `page` when `items` is split into pages of `page_size`.
pub fn page_slice<T>(items: &[T], page: u32, page_size: u32) -> &[T] {
    let page_size = page_size.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
