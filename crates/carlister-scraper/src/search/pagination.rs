//! Page-count derivation for search and dealer result pages.

use serde_json::Value;

use crate::extract::u64_at;

const TOTAL_PATHS: [&[&str]; 3] = [
    &["totalListings"],
    &["srpTrackingData", "totalListings"],
    &["summary", "totalListings"],
];

/// Totals for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTotals {
    pub total_count: u64,
    pub total_pages: u32,
}

/// Explicit result count advertised by the payload, if any.
#[must_use]
pub fn total_listings(value: &Value) -> Option<u64> {
    TOTAL_PATHS.iter().find_map(|path| u64_at(value, path))
}

/// Derives totals from an explicit count, or estimates them from how full the
/// current page is.
///
/// Without an explicit count a full page implies at least one more page; a
/// partial page is the last one; an empty page means the previous page was
/// the last.
#[must_use]
pub fn paginate(explicit_total: Option<u64>, page: u32, page_size: u32, found: usize) -> PageTotals {
    let page_size = page_size.max(1);
    match explicit_total {
        Some(total) => PageTotals {
            total_count: total,
            total_pages: u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX),
        },
        None => {
            let found_u64 = found as u64;
            let total_pages = if found_u64 >= u64::from(page_size) {
                page.saturating_add(1)
            } else if found > 0 {
                page
            } else {
                page.saturating_sub(1)
            };
            PageTotals {
                total_count: u64::from(page.saturating_sub(1)) * u64::from(page_size) + found_u64,
                total_pages,
            }
        }
    }
}
