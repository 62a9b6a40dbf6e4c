//! Bulk delivery endpoint

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use wdg_common::headers::RequestHeaders;

use crate::error::{ApiError, ApiResult};
use crate::resolver::DeliveryResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub srns: Vec<String>,
    #[serde(default)]
    pub target_region: Option<String>,
}

/// POST /api/delivery
///
/// Resolves a batch of SRNs. Every requested SRN appears exactly once in the
/// response, either as a resolved item or in `unprocessedSrns`.
pub async fn deliver(
    State(state): State<AppState>,
    header_map: HeaderMap,
    Json(request): Json<DeliveryRequest>,
) -> ApiResult<Json<DeliveryResponse>> {
    let headers = RequestHeaders::from_header_map(&header_map)?;
    if request.srns.is_empty() {
        return Err(ApiError::BadRequest("srns must not be empty".to_string()));
    }

    let response = state
        .resolver
        .resolve(&request.srns, request.target_region.as_deref(), &headers)
        .await;
    Ok(Json(response))
}
