//! Page arithmetic shared by every list query.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Page used when none is requested
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when none is requested
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest accepted page size
pub const MAX_LIMIT: u32 = 100;

/// A validated page request (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a page request, applying defaults and bounds
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = Vec::new();
        if page < 1 {
            errors.push("page must be at least 1".to_string());
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.push(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        if !errors.is_empty() {
            return Err(StorageError::Validation(errors));
        }

        Ok(Self { page, limit })
    }

    /// 1-based page number
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Pagination block returned with every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Total matching rows
    pub total: u64,
    /// Number of pages (`ceil(total / limit)`)
    pub pages: u64,
}

impl Pagination {
    /// Compute pagination for a request and a total row count
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

/// One page of rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Pagination block
    pub pagination: Pagination,
}
