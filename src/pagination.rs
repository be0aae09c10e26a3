//! This module defines the common functionality for paging data.

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 100,
        }
    }
}

/// A resolved page request: which page to fetch and how many rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: u64,
    /// The number of rows per page.
    pub size: u64,
}

impl Page {
    /// Resolve the raw `page` and `limit` query parameters against the
    /// application defaults.
    ///
    /// Pages are 1-based, so a page number or limit of zero is clamped to
    /// one.
    pub fn resolve(page: Option<u64>, limit: Option<u64>, config: &PaginationConfig) -> Self {
        Self {
            number: page.unwrap_or(config.default_page).max(1),
            size: limit.unwrap_or(config.default_page_size).max(1),
        }
    }

    /// The number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }
}
