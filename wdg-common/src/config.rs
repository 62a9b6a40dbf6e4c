//! Configuration loading shared by the gateway services
//!
//! Resolution priority for every setting: CLI flag (handled by the service
//! binary) → environment variable → TOML config file → compiled default.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Connection settings for one outbound backend
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://portal.example.com/de/ingestion/v1`
    pub base_url: String,
    /// Application key sent on every call
    pub app_key: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per call (1 disables retry)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial retry backoff in milliseconds (doubles per retry)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_key: app_key.into(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Apply `<PREFIX>_BASE_URL`, `<PREFIX>_APP_KEY`, `<PREFIX>_TIMEOUT_SECS`
    /// environment overrides on top of the current values.
    pub fn with_env_overrides(mut self, prefix: &str) -> Self {
        if let Ok(url) = std::env::var(format!("{prefix}_BASE_URL")) {
            self.base_url = url;
        }
        if let Ok(key) = std::env::var(format!("{prefix}_APP_KEY")) {
            self.app_key = key;
        }
        if let Ok(secs) = std::env::var(format!("{prefix}_TIMEOUT_SECS")) {
            if let Ok(secs) = secs.parse() {
                self.timeout_secs = secs;
            }
        }
        self
    }
}

/// Parse a TOML config file into a service config struct
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Environment variable with a compiled default
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        bind_addr: String,
        backend: BackendConfig,
    }

    #[test]
    fn backend_defaults_apply() {
        let cfg = BackendConfig::new("http://localhost:9000", "key");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.retry_backoff(), Duration::from_millis(250));
    }

    #[test]
    fn toml_round_trip_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
bind_addr = "127.0.0.1:8701"

[backend]
base_url = "http://portal.test/v1"
app_key = "abc"
timeout_secs = 5
"#
        )
        .unwrap();

        let cfg: TestConfig = load_toml_config(file.path()).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8701");
        assert_eq!(cfg.backend.base_url, "http://portal.test/v1");
        assert_eq!(cfg.backend.timeout_secs, 5);
        assert_eq!(cfg.backend.retry_attempts, 3);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = load_toml_config::<TestConfig>(Path::new("/nonexistent/wdg.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
