use axum::{
    extract::{Query, State},
    Extension, Json,
};
use carlister_core::{InventoryType, SearchResult};
use carlister_scraper::DealerInput;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DealerQuery {
    pub dealer_entity_id: Option<String>,
    pub dealer_url: Option<String>,
    pub page: Option<u32>,
    pub inventory_type: Option<String>,
}

pub(super) fn validate(query: DealerQuery) -> Result<DealerInput, String> {
    let inventory_type = match query.inventory_type.as_deref().map(str::trim) {
        None | Some("") => InventoryType::default(),
        Some(raw) => raw.parse::<InventoryType>().map_err(|e| e.to_string())?,
    };
    let input = DealerInput {
        dealer_entity_id: query.dealer_entity_id.unwrap_or_default().trim().to_owned(),
        dealer_url: query.dealer_url.unwrap_or_default().trim().to_owned(),
        page: query.page.unwrap_or(1),
        inventory_type,
    };
    input.validate().map_err(|e| e.to_string())?;
    Ok(input)
}

pub(super) async fn dealer_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DealerQuery>,
) -> Result<Json<SearchResult>, ApiError> {
    let input = validate(query).map_err(|reason| ApiError::validation(req_id.0.clone(), reason))?;
    tracing::info!(
        request_id = %req_id.0,
        dealer_entity_id = %input.dealer_entity_id,
        page = input.page,
        inventory_type = %input.inventory_type,
        "dealer inventory requested"
    );
    Ok(Json(state.scraper.scrape_dealer_page(&input).await))
}
