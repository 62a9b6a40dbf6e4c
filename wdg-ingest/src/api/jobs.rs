//! Job status polling endpoint

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use wdg_common::headers::RequestHeaders;

use crate::error::ApiResult;
use crate::jobs::JobsPullingResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PollJobsRequest {
    pub job_ids: Vec<String>,
}

/// POST /api/jobs/status
///
/// Classifies a batch of job ids into running/failed/completed. Always
/// returns a structurally complete partition; a backend fault for one id
/// leaves that id in the running bucket.
pub async fn poll_jobs(
    State(state): State<AppState>,
    header_map: HeaderMap,
    Json(request): Json<PollJobsRequest>,
) -> ApiResult<Json<JobsPullingResult>> {
    let headers = RequestHeaders::from_header_map(&header_map)?;
    tracing::debug!(jobs = request.job_ids.len(), "Job status poll received");

    let result = state.jobs.poll_batch(&request.job_ids, &headers).await;
    Ok(Json(result))
}
