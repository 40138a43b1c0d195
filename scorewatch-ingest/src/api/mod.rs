//! API Module
//!
//! HTTP API layer for the ingestion endpoint.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod report;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::trace::TraceLayer;

use crate::store::ReportStore;

/// Create the main API router with all endpoints
pub fn create_router(store: ReportStore) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Report endpoints
        .route("/api/reports", get(report::list_reports))
        .route("/api/reports/{correlation_id}", put(report::upload_report))
        .route("/api/reports/{correlation_id}", get(report::get_report))
        // Add state and middleware
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}
