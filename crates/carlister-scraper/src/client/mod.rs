//! HTTP client for the listing site's detail, search, and dealer endpoints.

mod headers;
mod origin;

use std::time::Duration;

use carlister_core::AppConfig;
use reqwest::Client;

use crate::error::ScraperError;
use crate::listing_id::ListingId;
use crate::params::{build_detail_params, build_vdp_params, ParamSet};
use crate::payload::Payload;
use crate::retry::retry_with_backoff;

pub use headers::HeaderProfile;
pub use origin::{origin_of, rebase_onto};

pub const DETAIL_PATH: &str = "/Cars/detailListingJson.action";
pub const SEARCH_PATH: &str = "/Cars/searchResults.action";
pub const DEALER_AJAX_PATH: &str = "/Cars/inventorylisting/ajaxFetchSubsetInventoryListing.action";
pub const VDP_PATH: &str = "/Cars/inventorylisting/vdp.action";

/// HTTP client for the listing site.
///
/// Holds one cookie-enabled session so that cookies set by a landing page are
/// replayed on the follow-up AJAX call. Every fetch runs inside
/// [`retry_with_backoff`]; exhausted retries surface as
/// [`ScraperError::FetchFailed`].
pub struct CarGurusClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    backoff_base_secs: u64,
}

impl CarGurusClient {
    /// Creates a client with the given timeout, `User-Agent`, and retry policy.
    ///
    /// `base_url` is scheme+host without a trailing slash. `max_attempts`
    /// counts the first try; values below 1 are treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_attempts: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_attempts: max_attempts.max(1),
            backoff_base_secs,
        })
    }

    /// Builds a client from application config.
    ///
    /// # Errors
    ///
    /// See [`CarGurusClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_attempts,
            config.retry_backoff_base_secs,
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the structured detail payload for one listing.
    ///
    /// Upstream may answer with markup instead of JSON; the caller decides
    /// whether to fall back.
    ///
    /// # Errors
    ///
    /// [`ScraperError::FetchFailed`] once all attempts are exhausted.
    pub async fn fetch_detail(&self, listing_id: &ListingId) -> Result<Payload, ScraperError> {
        let url = self.endpoint_url(DETAIL_PATH, &build_detail_params(listing_id))?;
        self.fetch(&url, &HeaderProfile::JsonApi).await
    }

    /// Fetches the canonical listing page for one listing.
    ///
    /// # Errors
    ///
    /// [`ScraperError::FetchFailed`] once all attempts are exhausted.
    pub async fn fetch_listing_page(&self, listing_id: &ListingId) -> Result<String, ScraperError> {
        let url = self.endpoint_url(VDP_PATH, &build_vdp_params(listing_id))?;
        Ok(self.fetch(&url, &HeaderProfile::Page).await?.into_text())
    }

    /// Fetches one page of generic search results.
    ///
    /// # Errors
    ///
    /// [`ScraperError::FetchFailed`] once all attempts are exhausted.
    pub async fn fetch_search(&self, params: &ParamSet) -> Result<Payload, ScraperError> {
        let url = self.endpoint_url(SEARCH_PATH, params)?;
        self.fetch(&url, &HeaderProfile::Page).await
    }

    /// Fetches an arbitrary site page as text, rebased onto the configured
    /// base URL.
    ///
    /// # Errors
    ///
    /// [`ScraperError::FetchFailed`] once all attempts are exhausted.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let url = self.rebase(url);
        Ok(self.fetch(&url, &HeaderProfile::Page).await?.into_text())
    }

    /// Fetches one page of a dealer's inventory from the AJAX endpoint.
    ///
    /// `referer` is the dealer landing page fetched earlier in this session.
    ///
    /// # Errors
    ///
    /// [`ScraperError::FetchFailed`] once all attempts are exhausted.
    pub async fn fetch_dealer_listings(
        &self,
        params: &ParamSet,
        referer: &str,
    ) -> Result<Payload, ScraperError> {
        let url = self.endpoint_url(DEALER_AJAX_PATH, params)?;
        let profile = HeaderProfile::Ajax {
            referer: self.rebase(referer),
        };
        self.fetch(&url, &profile).await
    }

    /// Rewrites absolute site URLs onto the configured base URL.
    #[must_use]
    pub fn rebase(&self, url: &str) -> String {
        rebase_onto(&self.base_url, url)
    }

    /// Builds `{base_url}{path}?{params}`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the base URL and path do not
    /// form a valid URL.
    fn endpoint_url(&self, path: &str, params: &ParamSet) -> Result<String, ScraperError> {
        let raw = format!("{}{path}", self.base_url);
        let mut url = reqwest::Url::parse(&raw).map_err(|e| ScraperError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params.iter() {
                pairs.append_pair(name, value);
            }
        }
        Ok(url.to_string())
    }

    async fn fetch(&self, url: &str, profile: &HeaderProfile) -> Result<Payload, ScraperError> {
        let headers = profile.headers();
        tracing::debug!(url, ?profile, "fetching upstream");

        let result = retry_with_backoff(self.max_attempts, self.backoff_base_secs, || {
            let url = url.to_owned();
            let headers = headers.clone();
            async move {
                let response = self.client.get(&url).headers(headers).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                let body = response.text().await?;
                Payload::from_body(&content_type, body, &url)
            }
        })
        .await;

        result.map_err(|err| match err {
            ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::Deserialize { .. } => ScraperError::FetchFailed {
                url: url.to_owned(),
                attempts: self.max_attempts,
                last_error: err.to_string(),
            },
            other => other,
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
