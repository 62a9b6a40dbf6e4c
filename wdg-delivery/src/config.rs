//! Configuration for wdg-delivery
//!
//! Priority: CLI flags → `WDG_DELIVERY_*` environment → TOML file → defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use wdg_common::config::{env_or, load_toml_config, BackendConfig};
use wdg_common::Result;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8702";

/// Which mapping-store implementation to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStoreKind {
    Sqlite,
    Static,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Listen address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Maximum concurrent lookups during batch fan-out
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
    /// Overall deadline for a delivery batch, in milliseconds
    #[serde(default = "default_batch_deadline_ms")]
    pub batch_deadline_ms: u64,
    /// Mapping store implementation
    #[serde(default = "default_store_kind")]
    pub mapping_store: MappingStoreKind,
    /// SQLite database path (sqlite store only)
    #[serde(default = "default_database")]
    pub database: String,
    /// Record-retrieval backend connection settings
    pub backend: BackendConfig,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_fan_out() -> usize {
    8
}

fn default_batch_deadline_ms() -> u64 {
    30_000
}

fn default_store_kind() -> MappingStoreKind {
    MappingStoreKind::Sqlite
}

fn default_database() -> String {
    "wdg-delivery.db".to_string()
}

impl DeliveryConfig {
    /// Resolve configuration from an optional TOML file plus environment
    /// overrides.
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_toml_config::<DeliveryConfig>(path)?,
            None => DeliveryConfig {
                bind_addr: default_bind_addr(),
                fan_out: default_fan_out(),
                batch_deadline_ms: default_batch_deadline_ms(),
                mapping_store: default_store_kind(),
                database: default_database(),
                backend: BackendConfig::new(
                    env_or("WDG_DELIVERY_BASE_URL", "http://127.0.0.1:9700/de/storage/v1"),
                    env_or("WDG_DELIVERY_APP_KEY", ""),
                ),
            },
        };

        config.backend = config.backend.with_env_overrides("WDG_DELIVERY");
        if let Ok(addr) = std::env::var("WDG_DELIVERY_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(database) = std::env::var("WDG_DELIVERY_DATABASE") {
            config.database = database;
        }
        Ok(config)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_millis(self.batch_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_a_config_file() {
        let config = DeliveryConfig::resolve(None).unwrap();
        assert_eq!(config.fan_out, 8);
        assert_eq!(config.mapping_store, MappingStoreKind::Sqlite);
        assert!(!config.bind_addr.is_empty());
    }

    #[test]
    fn store_kind_parses_from_lowercase() {
        let config: DeliveryConfig = toml::from_str(
            r#"
            mapping_store = "static"

            [backend]
            base_url = "http://127.0.0.1:9700"
            app_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(config.mapping_store, MappingStoreKind::Static);
    }
}
