//! Common error types for the gateway services

use thiserror::Error;

/// Common result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the shared gateway plumbing. Request-path failures
/// carry their own types (`SrnError`, `HeaderError`, `UpstreamError`); this
/// covers what is left, which today is configuration resolution.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
