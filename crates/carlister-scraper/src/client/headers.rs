//! Browser-like header sets applied per request.
//!
//! Profiles are immutable values; nothing about one request's headers leaks
//! into the next.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, PRAGMA,
    REFERER, UPGRADE_INSECURE_REQUESTS,
};

use super::origin::origin_of;

const ACCEPT_PAGE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_JSON: &str = "application/json, text/plain, */*";
const ACCEPT_AJAX: &str = "application/json, text/javascript, */*; q=0.01";
const LANGUAGE: &str = "en-US,en;q=0.9";

const SEC_FETCH_DEST: &str = "sec-fetch-dest";
const SEC_FETCH_MODE: &str = "sec-fetch-mode";
const SEC_FETCH_SITE: &str = "sec-fetch-site";
const X_REQUESTED_WITH: &str = "x-requested-with";

/// Which kind of browser request to imitate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Top-level page navigation.
    Page,
    /// `fetch()` call from a page script against a JSON endpoint.
    JsonApi,
    /// Same-origin XHR issued from an already-loaded page.
    Ajax { referer: String },
}

impl HeaderProfile {
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(LANGUAGE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        match self {
            HeaderProfile::Page => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_PAGE));
                headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
                headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("document"));
                headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("navigate"));
                headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("none"));
            }
            HeaderProfile::JsonApi => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
                headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("empty"));
                headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("cors"));
                headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("same-origin"));
            }
            HeaderProfile::Ajax { referer } => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_AJAX));
                headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
                headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("empty"));
                headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("cors"));
                headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("same-origin"));
                match HeaderValue::from_str(referer) {
                    Ok(value) => {
                        headers.insert(REFERER, value);
                    }
                    Err(e) => {
                        tracing::warn!(referer, error = %e, "referer is not a valid header value; omitting");
                    }
                }
                if let Some(origin) =
                    origin_of(referer).and_then(|o| HeaderValue::from_str(&o).ok())
                {
                    headers.insert(ORIGIN, origin);
                }
            }
        }
        headers
    }
}
