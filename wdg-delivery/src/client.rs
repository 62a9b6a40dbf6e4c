//! Record-retrieval backend HTTP client
//!
//! Fetches stored records by id and resolves file locations into signed
//! download URLs. Calls carry the same opaque header contract as ingestion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wdg_common::config::BackendConfig;
use wdg_common::headers::RequestHeaders;
use wdg_common::upstream::{retry_transient, UpstreamError};

const APP_KEY_HEADER: &str = "AppKey";
const PARTITION_HEADER: &str = "Data-Partition-Id";

/// A stored record. `data` is genuinely open-ended (work-product manifest
/// payloads), so it stays an opaque JSON map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub kind: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Signed, time-limited download location for a stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLocation {
    pub signed_url: String,
}

/// Seam for the record-retrieval backend
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn get_record(
        &self,
        record_id: &str,
        headers: &RequestHeaders,
    ) -> Result<Record, UpstreamError>;

    /// Resolve a backend file location into a signed download URL
    async fn get_file_location(
        &self,
        location: &str,
        headers: &RequestHeaders,
    ) -> Result<FileLocation, UpstreamError>;
}

/// reqwest-backed record client
pub struct RecordClient {
    http_client: reqwest::Client,
    config: BackendConfig,
}

impl RecordClient {
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
impl RecordApi for RecordClient {
    async fn get_record(
        &self,
        record_id: &str,
        headers: &RequestHeaders,
    ) -> Result<Record, UpstreamError> {
        let url = format!("{}/records/{}", self.config.base_url, record_id);
        let url = url.as_str();
        tracing::debug!(record_id = %record_id, "Fetching record");

        retry_transient(
            "get_record",
            self.config.retry_attempts,
            self.config.retry_backoff(),
            move || async move {
                let response = self
                    .with_context_headers(self.http_client.get(url), headers)
                    .send()
                    .await
                    .map_err(|e| UpstreamError::from_transport(&e))?;
                Self::read_json(response).await
            },
        )
        .await
    }

    async fn get_file_location(
        &self,
        location: &str,
        headers: &RequestHeaders,
    ) -> Result<FileLocation, UpstreamError> {
        let url = format!("{}/files", self.config.base_url);
        let url = url.as_str();
        tracing::debug!(location = %location, "Resolving signed file location");

        retry_transient(
            "get_file_location",
            self.config.retry_attempts,
            self.config.retry_backoff(),
            move || async move {
                let response = self
                    .with_context_headers(
                        self.http_client.get(url).query(&[("location", location)]),
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

/// Scripted in-memory record backend for tests
pub mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    pub struct ScriptedRecords {
        records: HashMap<String, Record>,
        fail_record_ids: HashSet<String>,
    }

    impl ScriptedRecords {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_record(mut self, record: Record) -> Self {
            self.records.insert(record.id.clone(), record);
            self
        }

        /// Script a transient backend fault for one record id
        pub fn failing_record(mut self, record_id: &str) -> Self {
            self.fail_record_ids.insert(record_id.to_string());
            self
        }
    }

    #[async_trait]
    impl RecordApi for ScriptedRecords {
        async fn get_record(
            &self,
            record_id: &str,
            _headers: &RequestHeaders,
        ) -> Result<Record, UpstreamError> {
            if self.fail_record_ids.contains(record_id) {
                return Err(UpstreamError::ServerError("record backend down".into()));
            }
            self.records
                .get(record_id)
                .cloned()
                .ok_or_else(|| UpstreamError::NotFound(record_id.to_string()))
        }

        async fn get_file_location(
            &self,
            location: &str,
            _headers: &RequestHeaders,
        ) -> Result<FileLocation, UpstreamError> {
            Ok(FileLocation {
                signed_url: format!("https://signed.example{location}"),
            })
        }
    }
}
