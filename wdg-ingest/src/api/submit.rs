//! File submission endpoint

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use wdg_common::headers::RequestHeaders;

use crate::error::ApiResult;
use crate::submit::{FileEntry, SubmittedJob};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub file_name: String,
}

impl From<SubmittedJob> for SubmitResponse {
    fn from(job: SubmittedJob) -> Self {
        Self {
            job_id: job.job_id,
            file_name: job.file_name,
        }
    }
}

/// POST /api/submit
///
/// Submits one file entry for ingestion and returns the backend job id.
/// Re-submitting an equivalent entry yields a new job id.
pub async fn submit_file(
    State(state): State<AppState>,
    header_map: HeaderMap,
    Json(entry): Json<FileEntry>,
) -> ApiResult<Json<SubmitResponse>> {
    let headers = RequestHeaders::from_header_map(&header_map)?;
    tracing::debug!(file_name = %entry.file_name, "Submit request received");

    let job = state.submit.submit(&entry, &headers).await?;
    Ok(Json(job.into()))
}
