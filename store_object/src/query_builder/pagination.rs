//! Page requests and paginated results

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Upper bound on the 1-based page number; keeps `offset()` well inside `i64`
pub const MAX_PAGE: i64 = 1_000_000;

/// LIMIT/OFFSET pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A validated 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Reject pages outside `1..=MAX_PAGE` and page sizes outside `1..=100`
    pub fn new(page: i64, page_size: i64) -> Result<Self, StoreError> {
        if !(1..=MAX_PAGE).contains(&page) {
            return Err(StoreError::ValidationError(format!(
                "page must be between 1 and {}, got {}",
                MAX_PAGE, page
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(StoreError::ValidationError(format!(
                "pageSize must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(StoreError::ValidationError(format!(
                "page {} with pageSize {} overflows the row offset",
                page, page_size
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Coerce into range: missing or invalid page → 1, page capped at `MAX_PAGE`,
    /// size clamped to `1..=100`, missing size → 20
    pub fn clamped(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn to_pagination(&self) -> Pagination {
        Pagination::new()
            .with_limit(self.page_size)
            .with_offset(self.offset())
    }

    /// Slice an in-memory list to this page
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(self.page_size).unwrap_or(0);
        items.iter().skip(start).take(size).cloned().collect()
    }
}

/// `ceil(total / page_size)`, 0 for an empty result or a non-positive size
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// One page of rows plus the unpaginated total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            data,
            total,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total, request.page_size()),
        }
    }

    /// Paginate an in-memory list
    pub fn from_slice(items: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        Self::new(request.slice(items), items.len() as i64, request)
    }

    /// Reshape rows while keeping pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_rejects_out_of_range() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(-1, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 101).is_err());
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn test_page_request_rejects_offset_overflow() {
        assert!(matches!(
            PageRequest::new(i64::MAX, 100),
            Err(StoreError::ValidationError(_))
        ));
        assert!(PageRequest::new(MAX_PAGE + 1, 1).is_err());

        let last = PageRequest::new(MAX_PAGE, MAX_PAGE_SIZE).unwrap();
        assert_eq!(last.to_pagination().offset, Some((MAX_PAGE - 1) * MAX_PAGE_SIZE));

        let capped = PageRequest::clamped(Some(i64::MAX), Some(100));
        assert_eq!(capped.page(), MAX_PAGE);
        assert!(capped.offset() > 0);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(PageRequest::clamped(None, None), PageRequest::new(1, 20).unwrap());
        assert_eq!(
            PageRequest::clamped(Some(-3), Some(500)),
            PageRequest::new(1, 100).unwrap()
        );
        assert_eq!(
            PageRequest::clamped(Some(4), Some(0)),
            PageRequest::new(4, 1).unwrap()
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 20).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 20).unwrap().offset(), 40);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(10, 3), 4);
        assert_eq!(total_pages(9, 3), 3);
        assert_eq!(total_pages(0, 3), 0);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_from_slice() {
        let items: Vec<i32> = (1..=7).collect();
        let page = PaginatedResult::from_slice(&items, PageRequest::new(2, 3).unwrap());
        assert_eq!(page.data, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);

        let past_end = PaginatedResult::from_slice(&items, PageRequest::new(9, 3).unwrap());
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.total, 7);
    }

    #[test]
    fn test_serializes_camel_case() {
        let page = PaginatedResult::new(vec![1], 1, PageRequest::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 20);
        assert_eq!(json["totalPages"], 1);
    }
}
