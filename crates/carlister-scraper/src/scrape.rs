//! High-level scraping operations: single listing, generic search, dealer page.

use std::time::Instant;

use carlister_core::{AppConfig, SearchResult, VehicleRecord};

use crate::client::CarGurusClient;
use crate::detail::{extract_html, extract_json};
use crate::error::ScraperError;
use crate::listing_id::{classify, extract_listing_id, ListingId};
use crate::params::{
    build_dealer_params, build_search_params, scrape_dealer_tokens, DealerInput, DealerTokens,
    SearchInput, PAGE_SIZE_DEALER, PAGE_SIZE_SEARCH,
};
use crate::payload::Payload;
use crate::search::{extract, SearchContext};

/// Entry point for every scraping operation.
///
/// `Send + Sync`; share it behind an `Arc`. Each call is a self-contained
/// sequence of upstream requests.
pub struct CarGurusScraper {
    client: CarGurusClient,
}

impl CarGurusScraper {
    #[must_use]
    pub fn new(client: CarGurusClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(CarGurusClient::from_config(config)?))
    }

    #[must_use]
    pub fn client(&self) -> &CarGurusClient {
        &self.client
    }

    /// Scrapes one listing from its URL.
    ///
    /// The structured detail endpoint is tried first. When it is unreachable
    /// or answers with markup, the canonical listing page is fetched and
    /// parsed instead.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] for URLs off the target site or outside
    ///   the listing family; no request is made.
    /// - [`ScraperError::IdentifierNotFound`] when no listing id can be found.
    /// - [`ScraperError::FetchFailed`] when both endpoints fail.
    /// - [`ScraperError::Parse`] / [`ScraperError::InsufficientData`] from
    ///   extraction.
    pub async fn scrape_detail(&self, url: &str) -> Result<VehicleRecord, ScraperError> {
        let started = Instant::now();
        let url = url.trim();
        let class = classify(url);
        if !class.is_target_domain {
            return Err(ScraperError::InvalidUrl {
                url: url.to_owned(),
                reason: "not a cargurus.com URL".to_owned(),
            });
        }
        if !class.is_listing_like {
            return Err(ScraperError::InvalidUrl {
                url: url.to_owned(),
                reason: "does not look like a vehicle listing".to_owned(),
            });
        }
        let listing_id = extract_listing_id(url).ok_or_else(|| ScraperError::IdentifierNotFound {
            url: url.to_owned(),
        })?;

        let record = match self.client.fetch_detail(&listing_id).await {
            Ok(Payload::Json(value)) => extract_json(&value, url)?,
            Ok(Payload::Html(_)) => {
                tracing::warn!(%listing_id, "detail endpoint answered with markup; falling back to listing page");
                self.scrape_listing_page(&listing_id, url).await?
            }
            Err(err @ ScraperError::FetchFailed { .. }) => {
                tracing::warn!(%listing_id, error = %err, "detail endpoint unreachable; falling back to listing page");
                self.scrape_listing_page(&listing_id, url).await?
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            %listing_id,
            title = %record.full_title,
            elapsed_ms = started.elapsed().as_millis(),
            "scraped listing"
        );
        Ok(record)
    }

    async fn scrape_listing_page(
        &self,
        listing_id: &ListingId,
        url: &str,
    ) -> Result<VehicleRecord, ScraperError> {
        let html = self.client.fetch_listing_page(listing_id).await?;
        extract_html(&html, url)
    }

    /// Runs one page of a generic inventory search.
    ///
    /// Never fails: invalid inputs and upstream errors become
    /// `success == false` with a message.
    pub async fn search_inventory(&self, input: &SearchInput) -> SearchResult {
        let started = Instant::now();
        let page = input.page.max(1);
        if let Err(err) = input.validate() {
            tracing::warn!(zip = %input.zip, error = %err, "rejected search input");
            return SearchResult::failure(page, err.to_string())
                .with_processing_time(started.elapsed().as_secs_f64());
        }
        let params = build_search_params(input);

        let result = match self.client.fetch_search(&params).await {
            Ok(payload) => extract(
                &payload,
                &SearchContext {
                    page,
                    page_size: PAGE_SIZE_SEARCH,
                    base_url: self.client.base_url(),
                },
            ),
            Err(err) => {
                tracing::error!(zip = %input.zip, page, error = %err, "search request failed");
                SearchResult::failure(page, err.to_string())
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!(
            zip = %input.zip,
            page,
            found = result.cars.len(),
            success = result.success,
            elapsed_secs = elapsed,
            "search completed"
        );
        result.with_processing_time(elapsed)
    }

    /// Fetches one page of a dealer's inventory.
    ///
    /// The dealer landing page is always fetched first, in the same cookie
    /// session, to obtain the pagination tokens the AJAX endpoint expects.
    /// A failed landing fetch degrades to fallback tokens rather than
    /// aborting. Inputs that fail [`DealerInput::validate`], including a
    /// landing URL off the target site, are rejected before any request.
    pub async fn scrape_dealer_page(&self, input: &DealerInput) -> SearchResult {
        let started = Instant::now();
        let page = input.page.max(1);
        if let Err(err) = input.validate() {
            tracing::warn!(
                dealer_url = %input.dealer_url,
                error = %err,
                "rejected dealer input"
            );
            return SearchResult::failure(page, err.to_string())
                .with_processing_time(started.elapsed().as_secs_f64());
        }

        let tokens = match self.client.fetch_page(&input.dealer_url).await {
            Ok(html) => scrape_dealer_tokens(&html),
            Err(err) => {
                tracing::warn!(
                    dealer_url = %input.dealer_url,
                    error = %err,
                    "dealer landing page fetch failed; using fallback tokens"
                );
                DealerTokens::fallback()
            }
        };
        let params = build_dealer_params(input, &tokens);

        let result = match self
            .client
            .fetch_dealer_listings(&params, &input.dealer_url)
            .await
        {
            Ok(payload) => extract(
                &payload,
                &SearchContext {
                    page,
                    page_size: PAGE_SIZE_DEALER,
                    base_url: self.client.base_url(),
                },
            ),
            Err(err) => {
                tracing::error!(
                    dealer_entity_id = %input.dealer_entity_id,
                    page,
                    error = %err,
                    "dealer inventory request failed"
                );
                SearchResult::failure(page, err.to_string())
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        tracing::info!(
            dealer_entity_id = %input.dealer_entity_id,
            page,
            found = result.cars.len(),
            fallback_tokens = tokens.is_fallback,
            elapsed_secs = elapsed,
            "dealer page completed"
        );
        result.with_processing_time(elapsed)
    }
}
