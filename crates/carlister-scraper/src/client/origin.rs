//! URL origin helpers for pointing absolute site URLs at the configured base.

use crate::listing_id::is_target_domain;

/// Scheme+host(+port) origin of `url`, or `None` if it does not parse.
#[must_use]
pub fn origin_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
}

/// Rewrites `url` so it is served from `base_url`.
///
/// Absolute URLs on the target site keep their path and query but take the
/// base origin; root-relative paths are prefixed with it. Anything else is
/// returned unchanged.
#[must_use]
pub fn rebase_onto(base_url: &str, url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        return format!("{base_url}{url}");
    }
    if !is_target_domain(url) {
        return url.to_owned();
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            let mut out = format!("{base_url}{}", parsed.path());
            if let Some(query) = parsed.query() {
                out.push('?');
                out.push_str(query);
            }
            if let Some(fragment) = parsed.fragment() {
                out.push('#');
                out.push_str(fragment);
            }
            out
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "could not parse target URL; using it as-is");
            url.to_owned()
        }
    }
}
