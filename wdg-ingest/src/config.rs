//! Configuration for wdg-ingest
//!
//! Priority: CLI flags → `WDG_INGEST_*` environment → TOML file → defaults.

use serde::Deserialize;
use std::path::Path;
use wdg_common::config::{env_or, load_toml_config, BackendConfig};
use wdg_common::Result;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8701";

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Listen address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Maximum concurrent backend calls during batch fan-out
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
    /// Ingestion backend connection settings
    pub backend: BackendConfig,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_fan_out() -> usize {
    8
}

impl IngestConfig {
    /// Resolve configuration from an optional TOML file plus environment
    /// overrides.
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_toml_config::<IngestConfig>(path)?,
            None => IngestConfig {
                bind_addr: default_bind_addr(),
                fan_out: default_fan_out(),
                backend: BackendConfig::new(
                    env_or("WDG_INGEST_BASE_URL", "http://127.0.0.1:9600/de/ingestion/v1"),
                    env_or("WDG_INGEST_APP_KEY", ""),
                ),
            },
        };

        config.backend = config.backend.with_env_overrides("WDG_INGEST");
        if let Ok(addr) = std::env::var("WDG_INGEST_BIND_ADDR") {
            config.bind_addr = addr;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_a_config_file() {
        let config = IngestConfig::resolve(None).unwrap();
        assert_eq!(config.fan_out, 8);
        assert!(!config.bind_addr.is_empty());
    }
}
