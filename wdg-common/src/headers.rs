//! Request header contract shared by the gateway services
//!
//! Header values are passed opaquely into every outbound backend call; the
//! gateway never interprets them beyond presence checks.

use axum::http::HeaderMap;
use thiserror::Error;

pub const AUTHORIZATION: &str = "authorization";
pub const PARTITION: &str = "data-partition-id";
pub const LEGAL_TAGS: &str = "legal-tags";
pub const ACCOUNT_ID: &str = "account-id";
pub const HOME_REGION_ID: &str = "resource-home-region-id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Missing required header: {0}")]
    Missing(&'static str),

    #[error("Header {0} is not valid UTF-8")]
    NotUtf8(&'static str),
}

/// Request-scoped context carried into every outbound call.
///
/// Immutable for the duration of a request, so batch fan-out can share it by
/// reference without synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub authorization: String,
    /// Normalized partition id (only `[A-Za-z0-9]` characters survive)
    pub partition: String,
    pub legal_tags: Option<String>,
    pub account_id: Option<String>,
    pub home_region_id: Option<String>,
}

impl RequestHeaders {
    /// Extract the gateway header contract from an incoming request.
    ///
    /// Authorization and partition are authentication preconditions; their
    /// absence aborts the call before any per-item work begins.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self, HeaderError> {
        let authorization = required(headers, AUTHORIZATION)?;
        let partition = normalize_partition(&required(headers, PARTITION)?);
        if partition.is_empty() {
            return Err(HeaderError::Missing(PARTITION));
        }

        Ok(Self {
            authorization,
            partition,
            legal_tags: optional(headers, LEGAL_TAGS)?,
            account_id: optional(headers, ACCOUNT_ID)?,
            home_region_id: optional(headers, HOME_REGION_ID)?,
        })
    }
}

fn required(headers: &HeaderMap, name: &'static str) -> Result<String, HeaderError> {
    optional(headers, name)?.ok_or(HeaderError::Missing(name))
}

fn optional(headers: &HeaderMap, name: &'static str) -> Result<Option<String>, HeaderError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.to_string()))
            .map_err(|_| HeaderError::NotUtf8(name)),
    }
}

/// Strip every character outside `[A-Za-z0-9]` from a partition id
pub fn normalize_partition(partition: &str) -> String {
    partition.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
