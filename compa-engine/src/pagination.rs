//! Pagination utilities for result listings

/// Page size constant for all pagination
pub const PAGE_SIZE: i64 = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page.
///
/// Ensures page is within valid bounds [1, total_pages].
///
/// # Examples
/// ```
/// use compa_engine::pagination::calculate_pagination;
///
/// // 250 total results = 3 pages (100 + 100 + 50)
/// let p = calculate_pagination(250, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(250, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 200);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    // i64::div_ceil is unstable (int_roundings); this is the stable equivalent.
    let total_pages =
        total_results.div_euclid(PAGE_SIZE) + (total_results.rem_euclid(PAGE_SIZE) != 0) as i64;
    let page = requested_page.clamp(1, total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(250, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_empty_results() {
        let p = calculate_pagination(0, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_clamps_low() {
        let p = calculate_pagination(250, -3);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_clamps_high() {
        let p = calculate_pagination(250, 99);
        assert_eq!(p.page, 3);
        assert_eq!(p.offset, 200);
    }
}
