//! Pagination types shared by every list screen and the JSON API

use serde::{Deserialize, Serialize};

/// Upper bound for a client-supplied page size
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 5,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        let per_page = self.per_page as i64;
        ((self.total + per_page - 1) / per_page) as u32
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// A page past the end is invalid, except the first page of an empty list.
    pub fn is_out_of_range(&self) -> bool {
        self.page > 1 && self.page > self.total_pages()
    }

    /// Whether the list spans more than one page
    pub fn is_paginated(&self) -> bool {
        self.total_pages() > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Transform the items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 0);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 1);

        let params = ListParams::new(3, 1000);
        assert_eq!(params.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_offset() {
        assert_eq!(ListParams::new(1, 5).offset(), 0);
        assert_eq!(ListParams::new(3, 5).offset(), 10);
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let result: PagedResult<i32> = PagedResult::new(vec![], 0, &ListParams::new(1, 5));
        assert_eq!(result.total_pages(), 0);
        assert!(!result.is_out_of_range());
        assert!(!result.has_next());
        assert!(!result.has_prev());
    }

    #[test]
    fn test_page_past_end_is_out_of_range() {
        let result: PagedResult<i32> = PagedResult::new(vec![], 5, &ListParams::new(2, 5));
        assert_eq!(result.total_pages(), 1);
        assert!(result.is_out_of_range());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let result = PagedResult::new(vec![1, 2], 7, &ListParams::new(2, 2)).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20]);
        assert_eq!(result.total, 7);
        assert_eq!(result.page, 2);
        assert_eq!(result.total_pages(), 4);
    }

    proptest! {
        #[test]
        fn prop_total_pages_covers_total(total in 0i64..10_000, per_page in 1u32..=100) {
            let result: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(1, per_page));
            let pages = result.total_pages() as i64;
            prop_assert!(pages * per_page as i64 >= total);
            prop_assert!(pages == 0 || (pages - 1) * (per_page as i64) < total);
        }

        #[test]
        fn prop_every_real_page_is_in_range(total in 1i64..1_000, per_page in 1u32..=100) {
            let pages = PagedResult::<()>::new(vec![], total, &ListParams::new(1, per_page)).total_pages();
            for page in 1..=pages {
                let result: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(page, per_page));
                prop_assert!(!result.is_out_of_range());
            }
            let past: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(pages + 1, per_page));
            prop_assert!(past.is_out_of_range());
        }
    }
}
