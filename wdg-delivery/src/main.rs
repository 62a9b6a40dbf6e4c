//! wdg-delivery - delivery gateway service
//!
//! Serves bulk SRN delivery requests backed by the schema-mapping store and
//! the external record-retrieval backend.

use anyhow::Result;
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wdg_delivery::client::RecordClient;
use wdg_delivery::config::{DeliveryConfig, MappingStoreKind};
use wdg_delivery::store::{MappingStore, SqliteMappingStore, StaticMappingStore};
use wdg_delivery::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "wdg-delivery", about = "Well Data Gateway delivery service")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address override
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting wdg-delivery v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = DeliveryConfig::resolve(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    info!(backend = %config.backend.base_url, "Resolved configuration");

    let store: Arc<dyn MappingStore> = match config.mapping_store {
        MappingStoreKind::Sqlite => {
            let options = SqliteConnectOptions::new()
                .filename(&config.database)
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new().connect_with(options).await?;
            let store = SqliteMappingStore::new(pool);
            store
                .init_schema()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize mapping store: {e}"))?;
            info!(database = %config.database, "Using SQLite mapping store");
            Arc::new(store)
        }
        MappingStoreKind::Static => {
            info!("Using in-memory mapping store");
            Arc::new(StaticMappingStore::new())
        }
    };

    let records = RecordClient::new(config.backend.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build record client: {e}"))?;
    let state = AppState::new(
        store,
        Arc::new(records),
        config.fan_out,
        config.batch_deadline(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("wdg-delivery listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
