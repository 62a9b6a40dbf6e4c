//! wdg-ingest - ingestion gateway service
//!
//! Accepts file submissions, forwards them to the external ingestion backend
//! and answers batch job-status polls.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wdg_ingest::client::IngestionClient;
use wdg_ingest::config::IngestConfig;
use wdg_ingest::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "wdg-ingest", about = "Well Data Gateway ingestion service")]
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

    info!("Starting wdg-ingest v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = IngestConfig::resolve(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    info!(backend = %config.backend.base_url, "Resolved configuration");

    let backend = IngestionClient::new(config.backend.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build ingestion client: {e}"))?;
    let state = AppState::new(Arc::new(backend), config.fan_out);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("wdg-ingest listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
