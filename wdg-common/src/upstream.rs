//! Upstream HTTP error taxonomy and transient-failure retry
//!
//! Every backend response status is classified into one error kind; only
//! server errors and transport faults are retry-eligible. 4xx failures are
//! terminal for the item that caused them.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failure of an outbound backend call, classified by HTTP status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("Bad request (400): {0}")]
    BadRequest(String),

    #[error("Unauthorized (401)")]
    Unauthorized,

    #[error("Forbidden (403)")]
    Forbidden,

    #[error("Not found (404): {0}")]
    NotFound(String),

    #[error("Server error (500): {0}")]
    ServerError(String),

    #[error("Unexpected status {0}: {1}")]
    Unknown(u16, String),

    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl UpstreamError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => UpstreamError::BadRequest(body),
            401 => UpstreamError::Unauthorized,
            403 => UpstreamError::Forbidden,
            404 => UpstreamError::NotFound(body),
            500..=599 => UpstreamError::ServerError(body),
            other => UpstreamError::Unknown(other, body),
        }
    }

    /// Classify a reqwest transport failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }

    /// True for failures worth retrying (5xx, timeouts, transport faults)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::ServerError(_) | UpstreamError::Timeout | UpstreamError::Transport(_)
        )
    }
}

/// Retry an outbound call on transient failures with exponential backoff.
///
/// `attempts` counts total tries, not retries; `attempts = 1` disables
/// retrying. Non-retryable errors return immediately.
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    attempts: u32,
    initial_backoff: Duration,
    mut operation: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut backoff = initial_backoff;

    for attempt in 1..=attempts.max(1) {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Upstream call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient upstream failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(5));
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("retry loop always returns")
}
