//! wdg-delivery library - delivery gateway service
//!
//! Resolves SRN batches into inline data or signed file locations through the
//! schema-mapping store and the record-retrieval backend.

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod resolver;
pub mod store;

use client::RecordApi;
use mapping::MappingService;
use resolver::DeliveryResolver;
use store::MappingStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<DeliveryResolver>,
}

impl AppState {
    /// Wire the resolver around one store and one record backend
    pub fn new(
        store: Arc<dyn MappingStore>,
        records: Arc<dyn RecordApi>,
        fan_out: usize,
        batch_deadline: Duration,
    ) -> Self {
        let mapping = Arc::new(MappingService::new(store));
        let resolver = Arc::new(DeliveryResolver::new(
            mapping,
            records,
            fan_out,
            batch_deadline,
        ));
        Self { resolver }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/delivery", post(api::deliver))
        .route("/health", get(api::health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
