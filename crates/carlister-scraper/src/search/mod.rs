//! Result-page extraction for generic searches and dealer inventory pages.
//!
//! Sources are tried from most to least structured: a tiles array in a JSON
//! payload, a tiles array inside an embedded script blob, then rendered result
//! cards. Nothing found is an empty, successful page.

mod cards;
mod embedded;
mod pagination;
mod tiles;

use carlister_core::{SearchResult, VehicleRecord};
use serde_json::Value;

use crate::payload::Payload;

pub use cards::{records_from_cards, MAX_CARDS};
pub use embedded::{extract_blobs, find_tiles_container};
pub use pagination::{paginate, total_listings, PageTotals};
pub use tiles::records_from_tiles;

/// Page position and URL base for one extraction.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub page: u32,
    pub page_size: u32,
    /// Base for resolving relative listing links.
    pub base_url: &'a str,
}

fn from_container(container: &Value, root: &Value, base_url: &str) -> (Vec<VehicleRecord>, Option<u64>) {
    let tiles = container
        .get("tiles")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let total = total_listings(container).or_else(|| total_listings(root));
    (records_from_tiles(tiles, base_url), total)
}

fn from_json(value: &Value, base_url: &str) -> (Vec<VehicleRecord>, Option<u64>) {
    match find_tiles_container(value) {
        Some(container) => from_container(container, value, base_url),
        None => (Vec::new(), total_listings(value)),
    }
}

fn from_html(html: &str, base_url: &str) -> (Vec<VehicleRecord>, Option<u64>) {
    for blob in extract_blobs(html) {
        if let Some(container) = find_tiles_container(&blob) {
            tracing::debug!("using tiles from embedded state blob");
            return from_container(container, &blob, base_url);
        }
    }
    (records_from_cards(html, base_url), None)
}

/// Extracts one page of results from an upstream payload.
#[must_use]
pub fn extract(payload: &Payload, ctx: &SearchContext<'_>) -> SearchResult {
    let page = ctx.page.max(1);
    let (cars, explicit_total) = match payload {
        Payload::Json(value) => from_json(value, ctx.base_url),
        Payload::Html(html) => from_html(html, ctx.base_url),
    };

    let totals = paginate(explicit_total, page, ctx.page_size, cars.len());
    tracing::debug!(
        page,
        found = cars.len(),
        total_count = totals.total_count,
        total_pages = totals.total_pages,
        "extracted result page"
    );
    SearchResult::page(cars, totals.total_count, page, totals.total_pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{PAGE_SIZE_DEALER, PAGE_SIZE_SEARCH};
    use serde_json::json;

    const BASE: &str = "https://www.cargurus.com";

    fn ctx(page: u32, page_size: u32) -> SearchContext<'static> {
        SearchContext {
            page,
            page_size,
            base_url: BASE,
        }
    }

    fn tile(id: u64, make: &str, model: &str) -> Value {
        json!({
            "type": "LISTING_USED_STANDARD",
            "data": {"id": id, "makeName": make, "modelName": model, "carYear": 2019}
        })
    }

    #[test]
    fn json_tiles_with_explicit_total() {
        let payload = Payload::Json(json!({
            "tiles": [tile(1, "Honda", "Fit"), tile(2, "Toyota", "Yaris")],
            "totalListings": 163
        }));
        let result = extract(&payload, &ctx(1, PAGE_SIZE_DEALER));
        assert!(result.success);
        assert_eq!(result.cars.len(), 2);
        assert_eq!(result.total_count, 163);
        assert_eq!(result.total_pages, 8);
        assert!(result.has_next_page);
        assert!(!result.has_previous_page);
    }

    #[test]
    fn embedded_blob_is_used_for_html_payloads() {
        let html = format!(
            r#"<html><script>window.__PREFLIGHT__ = {};</script></html>"#,
            json!({"srp": {"tiles": [tile(3, "Subaru", "Forester")], "srpTrackingData": {"totalListings": 41}}})
        );
        let result = extract(&Payload::Html(html), &ctx(2, PAGE_SIZE_SEARCH));
        assert_eq!(result.cars.len(), 1);
        assert_eq!(result.cars[0].make, "Subaru");
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next_page);
        assert!(result.has_previous_page);
    }

    #[test]
    fn empty_page_is_successful_and_empty() {
        let result = extract(
            &Payload::Html("<html><body>No matches</body></html>".to_owned()),
            &ctx(1, PAGE_SIZE_SEARCH),
        );
        assert!(result.success);
        assert!(result.cars.is_empty());
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next_page);
    }

    #[test]
    fn json_without_tiles_is_empty() {
        let result = extract(&Payload::Json(json!({"alert": "captcha"})), &ctx(1, PAGE_SIZE_SEARCH));
        assert!(result.success);
        assert!(result.cars.is_empty());
    }
}
