use serde::{Deserialize, Serialize};

/// Page-size used when the caller asks for a negative one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest window bound the stores accept (`LIMIT`/`OFFSET` are signed 64-bit).
const MAX_WINDOW: u64 = i64::MAX as u64;

/// Pagination parameters as callers supply them.
///
/// Out-of-range input is normalized rather than rejected: a page of zero or less reads the
/// first page and a negative page-size reads [`DEFAULT_PAGE_SIZE`] rows. A page-size of zero
/// returns no rows, but the total count is still reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE as i64,
        }
    }
}

impl Pagination {
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// 1-based page after normalization.
    #[must_use]
    pub fn page(&self) -> u64 {
        u64::try_from(self.page).ok().filter(|p| *p > 0).unwrap_or(1)
    }

    /// Rows per page after normalization.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::try_from(self.page_size).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Rows skipped before this page, capped so a page far past the end reads nothing.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(MAX_WINDOW)
    }

    /// Pages needed to show `total` rows; zero when the page-size is zero.
    #[must_use]
    pub fn total_pages(&self, total: u64) -> u64 {
        match self.limit() {
            0 => 0,
            size => total.div_ceil(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_page_reads_first_page() {
        for page in [-3, 0, 1] {
            let p = Pagination::new(page, 5);
            assert_eq!(p.page(), 1);
            assert_eq!(p.offset(), 0);
        }
    }

    #[test]
    fn negative_page_size_uses_default() {
        let p = Pagination::new(3, -1);
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn zero_page_size_has_no_rows_or_pages() {
        let p = Pagination::new(4, 0);
        assert_eq!(p.limit(), 0);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.total_pages(42), 0);
    }

    #[test]
    fn huge_pages_stay_within_sql_range() {
        let p = Pagination::new(i64::MAX, 10);
        assert_eq!(p.offset(), i64::MAX as u64);
        assert_eq!(Pagination::new(2, i64::MAX).offset(), i64::MAX as u64);
        assert_eq!(Pagination::new(1, i64::MAX).limit(), i64::MAX as u64);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 10).total_pages(21), 3);
        assert_eq!(Pagination::new(1, 10).total_pages(0), 0);
    }
}
