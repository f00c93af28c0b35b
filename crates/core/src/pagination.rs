//! Page-based pagination for listing operations.
//!
//! Callers pass a 1-based `page` and a `page_size`; out-of-range values are
//! clamped rather than rejected.

use serde::{Deserialize, Serialize};

/// Page size used when the caller asks for less than one item per page.
pub const DEFAULT_PAGE_SIZE: i32 = 50;

/// Upper bound on the page size.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Raw paging request as supplied by a caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i32,
    pub page_size: i32,
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
    pub fn new(page: i32, page_size: i32) -> Self {
        Self { page, page_size }
    }

    /// Apply the clamping rules and compute the row window.
    ///
    /// - `page < 1` becomes 1
    /// - `page_size < 1` becomes [`DEFAULT_PAGE_SIZE`]
    /// - `page_size > 100` becomes [`MAX_PAGE_SIZE`]
    pub fn clamp(self) -> Pagination {
        let page = self.page.max(1);
        let page_size = if self.page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE)
        };

        Pagination {
            limit: page_size as u32,
            offset: (page as u64 - 1) * page_size as u64,
        }
    }
}

/// Clamped row window (`LIMIT` / `OFFSET`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        PageRequest::default().clamp()
    }
}

impl Pagination {
    /// Slice an already ordered, already filtered in-memory result.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

/// One page of results plus the total number of matches across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        let p = PageRequest::new(1, 20).clamp();
        assert_eq!(p, Pagination { limit: 20, offset: 0 });
    }

    #[test]
    fn page_below_one_is_clamped_to_first_page() {
        assert_eq!(PageRequest::new(0, 10).clamp().offset, 0);
        assert_eq!(PageRequest::new(-7, 10).clamp().offset, 0);
    }

    #[test]
    fn page_size_below_one_defaults_to_fifty() {
        assert_eq!(PageRequest::new(1, 0).clamp().limit, 50);
        assert_eq!(PageRequest::new(2, -3).clamp(), Pagination { limit: 50, offset: 50 });
    }

    #[test]
    fn page_size_above_hundred_is_capped() {
        assert_eq!(PageRequest::new(3, 500).clamp(), Pagination { limit: 100, offset: 200 });
    }

    #[test]
    fn large_page_numbers_do_not_overflow() {
        let p = PageRequest::new(i32::MAX, 100).clamp();
        assert_eq!(p.offset, (i32::MAX as u64 - 1) * 100);
    }

    #[test]
    fn apply_slices_window() {
        let items: Vec<u32> = (0..7).collect();
        let p = PageRequest::new(2, 3).clamp();
        assert_eq!(p.apply(&items), vec![3, 4, 5]);

        let past_end = PageRequest::new(4, 3).clamp();
        assert!(past_end.apply(&items).is_empty());
    }
}
