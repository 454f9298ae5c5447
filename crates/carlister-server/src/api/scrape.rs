use axum::{extract::State, Extension, Json};
use carlister_core::VehicleRecord;
use carlister_scraper::is_target_domain;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeResponse {
    success: bool,
    data: Option<VehicleRecord>,
    error: Option<String>,
}

pub(super) async fn scrape_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let url = body.url.trim();
    if !is_target_domain(url) {
        return Err(ApiError::validation(
            req_id.0,
            "url must be a cargurus.com listing URL",
        ));
    }

    tracing::info!(request_id = %req_id.0, url, "scrape requested");
    let response = match state.scraper.scrape_detail(url).await {
        Ok(record) => ScrapeResponse {
            success: true,
            data: Some(record),
            error: None,
        },
        Err(e) => {
            tracing::warn!(request_id = %req_id.0, url, code = e.code(), error = %e, "scrape failed");
            ScrapeResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}
