use axum::{
    extract::{Query, State},
    Extension, Json,
};
use carlister_core::SearchResult;
use carlister_scraper::params::DEFAULT_SRP_VARIATION;
use carlister_scraper::SearchInput;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchQuery {
    pub zip: Option<String>,
    pub distance: Option<u32>,
    pub page: Option<u32>,
    pub sort_variation: Option<String>,
    pub new_used: Option<u8>,
}

/// Validates query parameters into a [`SearchInput`], or returns the reason
/// they are unacceptable.
pub(super) fn validate(query: SearchQuery) -> Result<SearchInput, String> {
    let input = SearchInput {
        zip: query.zip.unwrap_or_default().trim().to_owned(),
        distance: query.distance.unwrap_or(50),
        page: query.page.unwrap_or(1),
        sort_variation: query
            .sort_variation
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SRP_VARIATION.to_owned()),
        new_used: query.new_used.unwrap_or(1),
    };
    input.validate().map_err(|e| e.to_string())?;
    Ok(input)
}

pub(super) async fn search_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResult>, ApiError> {
    let input = validate(query).map_err(|reason| ApiError::validation(req_id.0.clone(), reason))?;
    tracing::info!(
        request_id = %req_id.0,
        zip = %input.zip,
        distance = input.distance,
        page = input.page,
        "search requested"
    );
    Ok(Json(state.scraper.search_inventory(&input).await))
}
