//! wdg-ingest library - ingestion gateway service
//!
//! Coordinates file submission against the external ingestion backend and
//! classifies the status of outstanding ingestion jobs.

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod submit;

use client::IngestionApi;
use jobs::JobStatusAggregator;
use submit::SubmitCoordinator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub submit: Arc<SubmitCoordinator>,
    pub jobs: Arc<JobStatusAggregator>,
}

impl AppState {
    /// Wire coordinators around one backend client
    pub fn new(backend: Arc<dyn IngestionApi>, fan_out: usize) -> Self {
        Self {
            submit: Arc::new(SubmitCoordinator::new(backend.clone(), fan_out)),
            jobs: Arc::new(JobStatusAggregator::new(backend, fan_out)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/submit", post(api::submit_file))
        .route("/api/jobs/status", post(api::poll_jobs))
        .route("/health", get(api::health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
