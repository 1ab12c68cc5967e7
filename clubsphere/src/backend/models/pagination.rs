//! Shared pagination types for backend list queries.
//!
//! The backend paginates with page-number + page-size query parameters and
//! wraps list responses in an envelope carrying the total page count.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_LIMIT: u32 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: u32 = 100;

/// Page-number + page-size parameters.
///
/// `page` is 1-based; zero is treated as the first page. `limit` is clamped
/// between 1 and 100, preventing both zero-result queries and excessive
/// fetching.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// First page with the default page size.
    pub fn first() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Render as query parameters.
    pub fn to_query(self) -> Vec<(&'static str, String)> {
        vec![("page", self.page().to_string()), ("limit", self.limit().to_string())]
    }
}

/// Envelope the backend wraps paginated lists in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let q = PageQuery::first();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn page_zero_is_first_page() {
        let q = PageQuery {
            page: Some(0),
            limit: None,
        };
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn limit_clamping() {
        let q = PageQuery {
            page: None,
            limit: Some(0),
        };
        assert_eq!(q.limit(), 1);

        let q = PageQuery {
            page: None,
            limit: Some(1000),
        };
        assert_eq!(q.limit(), MAX_LIMIT);

        let q = PageQuery {
            page: None,
            limit: Some(25),
        };
        assert_eq!(q.limit(), 25);
    }

    #[test]
    fn query_rendering() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(
            q.to_query(),
            vec![("page", "3".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn envelope_tolerates_missing_total() {
        let parsed: Paginated<u32> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(parsed.data, vec![1, 2]);
        assert_eq!(parsed.total_pages, 0);
    }
}
