//! Health Check API Handler

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::service::report_service;
use crate::store::ReportStore;

/// GET /health
/// Liveness check, also reporting how many reports are held
pub async fn health_check(State(store): State<ReportStore>) -> Json<Value> {
    let reports = report_service::count_reports(&store).await;
    Json(json!({ "status": "ok", "reports": reports }))
}
