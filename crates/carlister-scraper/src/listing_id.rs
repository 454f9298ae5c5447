//! Listing identifier extraction from the many URL shapes the site emits.
//!
//! Search deep links, hash-fragment deep links, dealer VDP links and short
//! `/l-<id>` links all carry the same numeric listing id in different places.
//! Patterns are tried in a fixed priority order and the first match wins; the
//! bare digit-run scan runs last so it can never pre-empt a precise match.

use std::sync::LazyLock;

use regex::Regex;

/// Hostnames accepted as the target site.
pub const TARGET_HOSTS: [&str; 2] = ["www.cargurus.com", "cargurus.com"];

/// Substrings that mark a URL as belonging to the listing resource family.
const LISTING_HINTS: [&str; 7] = [
    "/Cars/",
    "listingId=",
    "#listing=",
    "/listing=",
    "inventorylisting",
    "/l-",
    "vdp.action",
];

/// A numeric listing identifier, used only as a key into the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingId(pub(crate) String);

impl ListingId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlClass {
    pub is_target_domain: bool,
    pub is_listing_like: bool,
}

/// Classifies `url` by host and by loose listing-path heuristics.
#[must_use]
pub fn classify(url: &str) -> UrlClass {
    UrlClass {
        is_target_domain: is_target_domain(url),
        is_listing_like: LISTING_HINTS.iter().any(|hint| url.contains(hint)),
    }
}

/// Returns `true` when `url` is http(s) and its host is exactly one of
/// [`TARGET_HOSTS`].
#[must_use]
pub fn is_target_domain(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|u| {
        matches!(u.scheme(), "http" | "https")
            && u.host_str()
                .is_some_and(|host| TARGET_HOSTS.contains(&host))
    })
}

static QUERY_LISTING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]listingId=(\d+)").expect("valid regex"));
static PATH_LISTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/listing=(\d+)").expect("valid regex"));
static FRAGMENT_LISTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#listing=(\d+)").expect("valid regex"));
static PATH_SEGMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:l-|listing/|inventorylisting/)(\d+)").expect("valid regex")
});
static QUERY_ALT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&#](?:id|listing|inventoryId)=(\d+)").expect("valid regex")
});
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{6,}").expect("valid regex"));

/// Extracts the listing id from `url`, or `None` when no pattern matches.
#[must_use]
pub fn extract_listing_id(url: &str) -> Option<ListingId> {
    let precise: [&LazyLock<Regex>; 5] = [
        &QUERY_LISTING_ID,
        &PATH_LISTING,
        &FRAGMENT_LISTING,
        &PATH_SEGMENT_ID,
        &QUERY_ALT_ID,
    ];

    precise
        .iter()
        .find_map(|re| capture_digits(re, url))
        .or_else(|| {
            DIGIT_RUN
                .find_iter(url)
                .map(|m| m.as_str())
                .find(|digits| !is_likely_not_listing_id(digits, url))
                .map(str::to_owned)
        })
        .map(ListingId)
}

fn capture_digits(re: &Regex, url: &str) -> Option<String> {
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Rejects digit runs that are more likely a year, the request's own zip
/// code, or a phone number than a listing id.
fn is_likely_not_listing_id(digits: &str, url: &str) -> bool {
    match digits.len() {
        4 => digits.starts_with("19") || digits.starts_with("20"),
        5 => url.contains(&format!("zip={digits}")),
        10 => !digits.starts_with('0'),
        _ => false,
    }
}

#[cfg(test)]
#[path = "listing_id_test.rs"]
mod tests;
