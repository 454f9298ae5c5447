pub mod client;
pub mod detail;
pub mod error;
pub mod listing_id;
pub mod params;
pub mod payload;
pub mod scrape;
pub mod search;

mod extract;
mod record;
mod retry;

pub use client::{CarGurusClient, HeaderProfile};
pub use detail::{extract_html, extract_json};
pub use error::ScraperError;
pub use listing_id::{classify, extract_listing_id, is_target_domain, ListingId, UrlClass};
pub use params::{DealerInput, DealerTokens, ParamSet, SearchInput};
pub use payload::Payload;
pub use scrape::CarGurusScraper;
pub use search::SearchContext;
