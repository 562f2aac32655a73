//! Paging for `list_current` and the CLI listings.

use serde::{Deserialize, Serialize};

/// Rows per page when the caller does not say.
const DEFAULT_PAGE_SIZE: u64 = 25;
/// Upper bound on rows per page.
const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page request.
///
/// Deserialized values pass through [`PageRequest::new`], so a request is
/// always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PageParams")]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Builds a request, moving out-of-range values to the nearest valid one.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// `LIMIT` as bound in SQL.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// `OFFSET` as bound in SQL.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64) as i64
    }

    /// Slice an in-memory, already ordered collection the way SQL would.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.page_size as usize)
            .cloned()
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Wire shape of [`PageRequest`] before clamping.
#[derive(Deserialize)]
#[serde(default)]
struct PageParams {
    page: u64,
    page_size: u64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        Self::new(params.page, params.page_size)
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Page number, starting at 1.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
    /// Rows across all pages.
    pub total_items: u64,
    /// Number of pages; an empty result still has one.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Wraps the rows fetched for `request`.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.page_size.max(1)).max(1);
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
        }
    }
}
