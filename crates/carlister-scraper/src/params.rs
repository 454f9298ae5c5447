//! Query parameter construction for every upstream endpoint.
//!
//! All literal parameter names the site expects live in this module, so a
//! change to the upstream wire format touches only here and
//! [`crate::client`].

use std::sync::LazyLock;

use carlister_core::InventoryType;
use regex::Regex;

use crate::error::ScraperError;
use crate::listing_id::{is_target_domain, ListingId};

/// Results per page on the generic search endpoint.
pub const PAGE_SIZE_SEARCH: u32 = 20;

/// Results per page on the dealer AJAX pagination endpoint.
pub const PAGE_SIZE_DEALER: u32 = 23;

/// Substituted when a dealer landing page carries no `searchId`. Degraded
/// mode only: upstream may answer with unfiltered or empty inventory.
pub const FALLBACK_SEARCH_ID: &str = "3c7bd0f9-0a4f-4d1e-8a7e-6f4f0c2b9d51";

const DEFAULT_SORT_DIR: &str = "ASC";
const DEFAULT_SORT_TYPE: &str = "BEST_MATCH";
pub const DEFAULT_SRP_VARIATION: &str = "DEFAULT_SEARCH";

/// Widest search radius upstream accepts, in miles.
pub const MAX_DISTANCE: u32 = 500;

/// Ordered `(name, value)` query pairs for one upstream request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet(Vec<(&'static str, String)>);

impl ParamSet {
    fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    /// Value of the first pair named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Inputs to a generic inventory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInput {
    pub zip: String,
    pub distance: u32,
    pub page: u32,
    pub sort_variation: String,
    pub new_used: u8,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self {
            zip: String::new(),
            distance: 50,
            page: 1,
            sort_variation: DEFAULT_SRP_VARIATION.to_string(),
            new_used: 1,
        }
    }
}

impl SearchInput {
    /// Checks the inputs every frontend must reject before a search runs.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.zip.len() != 5 || !self.zip.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("zip", "must be exactly 5 digits"));
        }
        if !(1..=MAX_DISTANCE).contains(&self.distance) {
            return Err(invalid(
                "distance",
                format!("must be between 1 and {MAX_DISTANCE}"),
            ));
        }
        if self.page < 1 {
            return Err(invalid("page", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ScraperError {
    ScraperError::InvalidInput {
        field,
        reason: reason.into(),
    }
}

/// Inputs to one page of a dealer's inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealerInput {
    pub dealer_entity_id: String,
    pub dealer_url: String,
    pub page: u32,
    pub inventory_type: InventoryType,
}

impl DealerInput {
    /// Checks the dealer id, landing URL, and page before any request is made.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] when `dealer_url` is off the target site.
    /// - [`ScraperError::InvalidInput`] for a non-numeric id or page zero.
    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.dealer_entity_id.is_empty()
            || !self.dealer_entity_id.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("dealer entity id", "must be numeric"));
        }
        if !is_target_domain(&self.dealer_url) {
            return Err(ScraperError::InvalidUrl {
                url: self.dealer_url.clone(),
                reason: "not a cargurus.com URL".to_owned(),
            });
        }
        if self.page < 1 {
            return Err(invalid("page", "must be at least 1"));
        }
        Ok(())
    }
}

/// Session tokens scraped from a dealer landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealerTokens {
    pub search_id: String,
    pub page_receipt: Option<String>,
    /// `true` when `search_id` is [`FALLBACK_SEARCH_ID`].
    pub is_fallback: bool,
}

impl DealerTokens {
    /// Degraded tokens used when the landing page yields none.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            search_id: FALLBACK_SEARCH_ID.to_string(),
            page_receipt: None,
            is_fallback: true,
        }
    }
}

fn offset(page: u32, page_size: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Fixed parameters for the JSON detail endpoint.
#[must_use]
pub fn build_detail_params(listing_id: &ListingId) -> ParamSet {
    let mut params = ParamSet::default();
    params.push("inventoryListing", listing_id.as_str());
    params.push("inclusionType", "DEFAULT");
    params.push("sourceContext", "carGurusHomePageModel");
    params.push("isDAVE", "true");
    params
}

/// Parameters for the canonical listing page, used by the HTML fallback.
#[must_use]
pub fn build_vdp_params(listing_id: &ListingId) -> ParamSet {
    let mut params = ParamSet::default();
    params.push("listingId", listing_id.as_str());
    params.push("sourceContext", "carGurusHomePageModel");
    params
}

/// Parameters for the generic search endpoint.
///
/// A fresh `searchId` is generated on every call; it is a per-request token
/// and is never reused across pages.
#[must_use]
pub fn build_search_params(input: &SearchInput) -> ParamSet {
    let page = input.page.max(1);
    let mut params = ParamSet::default();
    params.push("zip", input.zip.as_str());
    params.push("distance", input.distance.to_string());
    params.push("newUsed", input.new_used.to_string());
    params.push("sortDir", DEFAULT_SORT_DIR);
    params.push("sortType", DEFAULT_SORT_TYPE);
    params.push("srpVariation", input.sort_variation.as_str());
    params.push("pageNumber", page.to_string());
    params.push("offset", offset(page, PAGE_SIZE_SEARCH).to_string());
    params.push("maxResults", PAGE_SIZE_SEARCH.to_string());
    params.push("inventorySearchWidgetType", "AUTO");
    params.push("isDeliveryEnabled", "true");
    params.push("nonShippableBaseline", "0");
    params.push("searchId", uuid::Uuid::new_v4().to_string());
    params
}

/// Upstream code for a dealer inventory filter.
#[must_use]
pub fn inventory_type_code(inventory_type: InventoryType) -> &'static str {
    match inventory_type {
        InventoryType::All => "",
        InventoryType::New => "1",
        InventoryType::Used => "2",
        InventoryType::NewCertified => "8",
    }
}

static SCRIPT_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"));
static SEARCH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?searchId["']?\s*[:=]\s*["']([A-Za-z0-9_\-]+)["']"#).expect("valid regex")
});
static PAGE_RECEIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?pageReceipt["']?\s*[:=]\s*["']([A-Za-z0-9_\-=+/.]+)["']"#)
        .expect("valid regex")
});

/// Scrapes `searchId` and `pageReceipt` from a dealer landing page's script
/// content, substituting [`FALLBACK_SEARCH_ID`] when no search id is present.
#[must_use]
pub fn scrape_dealer_tokens(html: &str) -> DealerTokens {
    let scripts: Vec<&str> = SCRIPT_BODY
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let find = |re: &Regex| {
        scripts.iter().find_map(|script| {
            re.captures(script)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_owned())
        })
    };

    let page_receipt = find(&PAGE_RECEIPT);
    match find(&SEARCH_ID) {
        Some(search_id) => DealerTokens {
            search_id,
            page_receipt,
            is_fallback: false,
        },
        None => {
            tracing::warn!("dealer landing page has no searchId; using fallback token");
            DealerTokens {
                page_receipt,
                ..DealerTokens::fallback()
            }
        }
    }
}

/// Parameters for the dealer AJAX pagination endpoint.
///
/// `tokens` must come from a landing-page fetch made earlier in the same
/// session; see [`scrape_dealer_tokens`].
#[must_use]
pub fn build_dealer_params(input: &DealerInput, tokens: &DealerTokens) -> ParamSet {
    let page = input.page.max(1);
    let mut params = ParamSet::default();
    params.push("searchId", tokens.search_id.as_str());
    if let Some(receipt) = &tokens.page_receipt {
        params.push("pageReceipt", receipt.as_str());
    }
    params.push(
        "entitySelectingHelper.selectedEntity",
        format!("sp{}", input.dealer_entity_id),
    );
    params.push("newUsed", inventory_type_code(input.inventory_type));
    params.push("pageNumber", page.to_string());
    params.push("offset", offset(page, PAGE_SIZE_DEALER).to_string());
    params.push("maxResults", PAGE_SIZE_DEALER.to_string());
    params.push("sortDir", DEFAULT_SORT_DIR);
    params.push("sortType", DEFAULT_SORT_TYPE);
    params.push("isDealerInventory", "true");
    params
}
