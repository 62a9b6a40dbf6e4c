//! Ingestion backend HTTP client
//!
//! Three calls against the backend's ingestion API: acquire a landing-zone
//! signed location, submit a file with its manifest metadata, and query job
//! status. Every call carries the bearer authorization token, the
//! application key and the normalized partition id from the request context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wdg_common::config::BackendConfig;
use wdg_common::headers::RequestHeaders;
use wdg_common::upstream::{retry_transient, UpstreamError};

const APP_KEY_HEADER: &str = "AppKey";
const PARTITION_HEADER: &str = "Data-Partition-Id";
const ACCOUNT_ID_HEADER: &str = "Account-Id";

/// Landing-zone acquisition result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResult {
    /// Time-limited pre-authorized upload URL
    pub location_url: String,
    /// Backend-relative path the submitted file will live under
    pub relative_file_path: String,
}

/// Discriminator for how the submitted file content is referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileInput {
    #[serde(rename = "FILE_PATH")]
    FilePath,
    #[serde(rename = "FILE_BYTES")]
    FileBytes,
}

/// Submission payload: file reference plus manifest metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFileObject {
    pub kind: String,
    /// Serialized ACL document, stored opaquely by the backend
    pub acl: String,
    pub legal_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Base64-encoded content when the file is submitted inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_bytes: Option<String>,
    pub file_input: FileInput,
    /// Serialized ingestor routine selection, when the resource type needs one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestor_routines: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFileResult {
    pub job_id: String,
}

/// Terminal/non-terminal classification of an ingestion job as reported by
/// the backend. The gateway only ever observes these; it never drives a
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterJobStatus {
    Running,
    Failed,
    Completed,
}

impl MasterJobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MasterJobStatus::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub job_id: String,
    pub file_name: Option<String>,
    pub time_stamp: Option<String>,
    /// Free-text progress description from the backend
    pub current_job_status: Option<String>,
    pub master_job_status: MasterJobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_info: JobInfo,
    /// Backend summary document; open-ended, kept opaque
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
}

/// Seam for the ingestion backend, so coordinators and aggregators can be
/// exercised against a scripted backend in tests.
#[async_trait]
pub trait IngestionApi: Send + Sync {
    async fn landing_zone(
        &self,
        file_name: &str,
        headers: &RequestHeaders,
    ) -> Result<SignedUrlResult, UpstreamError>;

    async fn submit_file(
        &self,
        submission: &SubmitFileObject,
        headers: &RequestHeaders,
    ) -> Result<SubmitFileResult, UpstreamError>;

    async fn job_status(
        &self,
        job_id: &str,
        headers: &RequestHeaders,
    ) -> Result<JobStatusResponse, UpstreamError>;
}

/// reqwest-backed ingestion backend client
pub struct IngestionClient {
    http_client: reqwest::Client,
    config: BackendConfig,
}

impl IngestionClient {
    pub fn new(config: BackendConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self { http_client, config })
    }

    fn with_context_headers(
        &self,
        request: reqwest::RequestBuilder,
        headers: &RequestHeaders,
    ) -> reqwest::RequestBuilder {
        request
            .header(reqwest::header::AUTHORIZATION, &headers.authorization)
            .header(APP_KEY_HEADER, &self.config.app_key)
            .header(PARTITION_HEADER, &headers.partition)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), body));
        }
        response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))
    }
}

#[async_trait]
impl IngestionApi for IngestionClient {
    async fn landing_zone(
        &self,
        file_name: &str,
        headers: &RequestHeaders,
    ) -> Result<SignedUrlResult, UpstreamError> {
        let url = format!("{}/landingzoneUrl", self.config.base_url);
        let url = url.as_str();
        tracing::debug!(file_name = %file_name, "Requesting landing zone location");

        retry_transient(
            "landing_zone",
            self.config.retry_attempts,
            self.config.retry_backoff(),
            move || async move {
                let response = self
                    .with_context_headers(
                        self.http_client.get(url).query(&[("fileName", file_name)]),
                        headers,
                    )
                    .send()
                    .await
                    .map_err(|e| UpstreamError::from_transport(&e))?;
                Self::read_json(response).await
            },
        )
        .await
    }

    async fn submit_file(
        &self,
        submission: &SubmitFileObject,
        headers: &RequestHeaders,
    ) -> Result<SubmitFileResult, UpstreamError> {
        let url = format!("{}/submit", self.config.base_url);
        tracing::debug!(kind = %submission.kind, "Submitting file to ingestion backend");

        // Submission is not idempotent: the backend mints a new job for every
        // call, so no retry wrapper here.
        let mut request = self
            .with_context_headers(self.http_client.post(&url).json(submission), headers);
        if let Some(account_id) = &headers.account_id {
            request = request.header(ACCOUNT_ID_HEADER, account_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::from_transport(&e))?;
        let result: SubmitFileResult = Self::read_json(response).await?;

        tracing::info!(job_id = %result.job_id, "File submitted for ingestion");
        Ok(result)
    }

    async fn job_status(
        &self,
        job_id: &str,
        headers: &RequestHeaders,
    ) -> Result<JobStatusResponse, UpstreamError> {
        let url = format!("{}/status", self.config.base_url);
        let url = url.as_str();

        retry_transient(
            "job_status",
            self.config.retry_attempts,
            self.config.retry_backoff(),
            move || async move {
                let response = self
                    .with_context_headers(
                        self.http_client.get(url).query(&[("jobId", job_id)]),
                        headers,
                    )
                    .send()
                    .await
                    .map_err(|e| UpstreamError::from_transport(&e))?;
                Self::read_json(response).await
            },
        )
        .await
    }
}

/// Scripted in-memory ingestion backend for exercising coordinators and
/// aggregators without a network.
pub mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    enum Script {
        Status(MasterJobStatus),
        Error,
        /// Reports running until the nth status query, then completed
        CompleteAfter(u64),
    }

    #[derive(Default)]
    pub struct ScriptedBackend {
        jobs: HashMap<String, Script>,
        status_calls: Mutex<HashMap<String, u64>>,
        next_job: AtomicU64,
        fail_landing_zone: bool,
        fail_landing_zone_files: HashSet<String>,
        fail_submit: bool,
        submissions: Mutex<Vec<SubmitFileObject>>,
    }

    impl ScriptedBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_status(mut self, job_id: &str, status: MasterJobStatus) -> Self {
            self.jobs.insert(job_id.to_string(), Script::Status(status));
            self
        }

        pub fn with_error(mut self, job_id: &str) -> Self {
            self.jobs.insert(job_id.to_string(), Script::Error);
            self
        }

        pub fn completing_after(mut self, job_id: &str, polls: u64) -> Self {
            self.jobs
                .insert(job_id.to_string(), Script::CompleteAfter(polls));
            self
        }

        pub fn failing_landing_zone(mut self) -> Self {
            self.fail_landing_zone = true;
            self
        }

        /// Fail landing-zone acquisition for one file name only
        pub fn failing_landing_zone_for(mut self, file_name: &str) -> Self {
            self.fail_landing_zone_files.insert(file_name.to_string());
            self
        }

        pub fn failing_submit(mut self) -> Self {
            self.fail_submit = true;
            self
        }

        pub fn submissions(&self) -> Vec<SubmitFileObject> {
            self.submissions.lock().unwrap().clone()
        }

        fn response(job_id: &str, status: MasterJobStatus) -> JobStatusResponse {
            JobStatusResponse {
                job_info: JobInfo {
                    job_id: job_id.to_string(),
                    file_name: Some(format!("{job_id}.las")),
                    time_stamp: None,
                    current_job_status: None,
                    master_job_status: status,
                },
                summary: None,
            }
        }
    }

    #[async_trait]
    impl IngestionApi for ScriptedBackend {
        async fn landing_zone(
            &self,
            file_name: &str,
            _headers: &RequestHeaders,
        ) -> Result<SignedUrlResult, UpstreamError> {
            if self.fail_landing_zone || self.fail_landing_zone_files.contains(file_name) {
                return Err(UpstreamError::ServerError("landing zone down".to_string()));
            }
            Ok(SignedUrlResult {
                location_url: format!("https://signed.example/{file_name}"),
                relative_file_path: format!("zone/{file_name}"),
            })
        }

        async fn submit_file(
            &self,
            submission: &SubmitFileObject,
            _headers: &RequestHeaders,
        ) -> Result<SubmitFileResult, UpstreamError> {
            if self.fail_submit {
                return Err(UpstreamError::BadRequest("unknown kind".to_string()));
            }
            self.submissions.lock().unwrap().push(submission.clone());
            let n = self.next_job.fetch_add(1, Ordering::SeqCst);
            Ok(SubmitFileResult {
                job_id: format!("job-{n}"),
            })
        }

        async fn job_status(
            &self,
            job_id: &str,
            _headers: &RequestHeaders,
        ) -> Result<JobStatusResponse, UpstreamError> {
            match self.jobs.get(job_id) {
                None => Err(UpstreamError::NotFound(job_id.to_string())),
                Some(Script::Error) => {
                    Err(UpstreamError::Transport("connection reset".to_string()))
                }
                Some(Script::Status(status)) => Ok(Self::response(job_id, *status)),
                Some(Script::CompleteAfter(polls)) => {
                    let mut calls = self.status_calls.lock().unwrap();
                    let count = calls.entry(job_id.to_string()).or_insert(0);
                    *count += 1;
                    let status = if *count >= *polls {
                        MasterJobStatus::Completed
                    } else {
                        MasterJobStatus::Running
                    };
                    Ok(Self::response(job_id, status))
                }
            }
        }
    }
}
