//! Page request normalization and the paginated result envelope.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Caller pagination input; `None` falls back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Applies defaults and rejects zero values. Limits above
    /// [`MAX_LIMIT`] are clamped.
    pub fn resolve(&self) -> Result<PageWindow, ValidationError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page == 0 {
            return Err(ValidationError::InvalidPagination {
                field: "page",
                value: page,
            });
        }
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(ValidationError::InvalidPagination {
                field: "limit",
                value: limit,
            });
        }
        Ok(PageWindow {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }
}

impl PageWindow {
    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Total matches ignoring pagination.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, window: PageWindow) -> Self {
        Self {
            data,
            total,
            page: window.page,
            limit: window.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageRequest, PageWindow, MAX_LIMIT};
    use crate::model::validation::ValidationError;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let window = PageRequest::default().resolve().unwrap();
        assert_eq!(window, PageWindow { page: 1, limit: 10 });
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let window = PageRequest::new(3, 25).resolve().unwrap();
        assert_eq!(window.offset(), 50);
    }

    #[test]
    fn zero_page_is_rejected_and_limit_is_capped() {
        assert_eq!(
            PageRequest::new(0, 10).resolve(),
            Err(ValidationError::InvalidPagination {
                field: "page",
                value: 0
            })
        );
        let capped = PageRequest::new(1, 5_000).resolve().unwrap();
        assert_eq!(capped.limit, MAX_LIMIT);
    }
}
