//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde::Deserialize;

use crate::api::middleware::ApiError;
use crate::models::ListParams;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for API listings
pub fn default_page_size() -> u32 {
    10
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.page_size)
    }
}

/// Parse a numeric path segment. Anything else is treated as a missing record.
pub fn parse_id(raw: &str, entity: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found(format!("{} {} not found", entity, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "Topic").unwrap(), 42);
        let err = parse_id("abc", "Topic").unwrap_err();
        assert_eq!(err.error.code, "NOT_FOUND");
        assert_eq!(err.error.message, "Topic abc not found");
    }

    #[test]
    fn test_pagination_query_clamps_page_size() {
        let query = PaginationQuery {
            page: 0,
            page_size: 1000,
        };
        let params = query.params();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, crate::models::MAX_PER_PAGE);
    }
}
