//! File submission coordination
//!
//! For one file entry: acquire a landing-zone location from the ingestion
//! backend, then submit the file reference together with its manifest
//! metadata, returning the backend's job id. A landing-zone failure aborts
//! the submission and carries the root cause.

use base64::Engine;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use wdg_common::headers::RequestHeaders;
use wdg_common::srn::{ResourceType, ResourceTypeId, SrnError};
use wdg_common::upstream::UpstreamError;

use crate::client::{FileInput, IngestionApi, SubmitFileObject, SubmitFileResult};

#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Srn(#[from] SrnError),

    #[error("Failed to acquire landing zone for {file_name}: {source}")]
    LandingZone {
        file_name: String,
        source: UpstreamError,
    },

    #[error("Submission rejected by ingestion backend: {0}")]
    Submission(UpstreamError),
}

/// Access-control groups carried alongside the submitted record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AclGroups {
    pub owner: Option<String>,
    pub viewer: Option<String>,
}

#[derive(Serialize)]
struct AclObject<'a> {
    acl: &'a AclGroups,
}

/// How the file content reaches the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    /// Already staged at a backend-reachable path
    Path(String),
    /// Inline content, submitted base64-encoded
    Bytes(Vec<u8>),
}

/// One file to ingest, with its manifest metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_name: String,
    /// Target record kind, e.g. `tenant:wks:WellLog:1.0.0`
    pub kind: String,
    #[serde(default)]
    pub acl: AclGroups,
    pub legal_tags: Option<String>,
    pub source: FileSource,
    /// SRN type id driving ingestor routine selection
    pub resource_type_id: String,
}

/// Handle returned by a successful submission, valid for status polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub job_id: String,
    pub file_name: String,
    /// Backend-relative path the file was staged under
    pub relative_file_path: String,
}

/// Orchestrates the two-step submission against the ingestion backend.
///
/// Submission is not idempotent: submitting an equivalent entry twice yields
/// two distinct job ids.
pub struct SubmitCoordinator {
    backend: Arc<dyn IngestionApi>,
    fan_out: usize,
}

impl SubmitCoordinator {
    pub fn new(backend: Arc<dyn IngestionApi>, fan_out: usize) -> Self {
        Self {
            backend,
            fan_out: fan_out.max(1),
        }
    }

    /// Submit one file entry, returning a job handle for status polling
    pub async fn submit(
        &self,
        entry: &FileEntry,
        headers: &RequestHeaders,
    ) -> Result<SubmittedJob, SubmitError> {
        let type_id = ResourceTypeId::parse(&entry.resource_type_id)?;

        let location = self
            .backend
            .landing_zone(&entry.file_name, headers)
            .await
            .map_err(|source| SubmitError::LandingZone {
                file_name: entry.file_name.clone(),
                source,
            })?;
        tracing::debug!(
            file_name = %entry.file_name,
            relative_path = %location.relative_file_path,
            "Acquired landing zone location"
        );

        let submission = build_submission(entry, &type_id, &location.relative_file_path);
        let result: SubmitFileResult = self
            .backend
            .submit_file(&submission, headers)
            .await
            .map_err(SubmitError::Submission)?;

        tracing::info!(
            job_id = %result.job_id,
            file_name = %entry.file_name,
            "Submission accepted by ingestion backend"
        );

        Ok(SubmittedJob {
            job_id: result.job_id,
            file_name: entry.file_name.clone(),
            relative_file_path: location.relative_file_path,
        })
    }

    /// Submit a batch with bounded fan-out; per-file failures are absorbed
    /// into that file's outcome instead of aborting the batch.
    pub async fn submit_all(
        &self,
        entries: &[FileEntry],
        headers: &RequestHeaders,
    ) -> Vec<(String, Result<SubmittedJob, SubmitError>)> {
        stream::iter(entries)
            .map(|entry| async move {
                (entry.file_name.clone(), self.submit(entry, headers).await)
            })
            .buffer_unordered(self.fan_out)
            .collect()
            .await
    }
}

fn build_submission(
    entry: &FileEntry,
    type_id: &ResourceTypeId,
    relative_file_path: &str,
) -> SubmitFileObject {
    let (file_path, file_bytes, file_input) = match &entry.source {
        FileSource::Path(_) => (
            Some(format!("gs:/{}", relative_file_path)),
            None,
            FileInput::FilePath,
        ),
        FileSource::Bytes(bytes) => (
            None,
            Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            FileInput::FileBytes,
        ),
    };

    SubmitFileObject {
        kind: entry.kind.clone(),
        acl: serialize_acl(&entry.acl),
        legal_tags: entry.legal_tags.clone(),
        file_path,
        file_bytes,
        file_input,
        ingestor_routines: ingestor_routines(type_id),
    }
}

fn serialize_acl(acl: &AclGroups) -> String {
    // The backend stores the ACL as an opaque serialized document.
    serde_json::to_string(&AclObject { acl }).unwrap_or_else(|_| "{}".to_string())
}

/// Well log components go through the LAS ingestor; everything else uses the
/// backend default routine.
fn ingestor_routines(type_id: &ResourceTypeId) -> Option<String> {
    if type_id.resource_type() == ResourceType::WpcWellLog {
        Some(r#"[{"lasIngestor":{}}]"#.to_string())
    } else {
        None
    }
}
