//! Report API Handlers
//!
//! HTTP endpoints for SARIF report ingestion.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scorewatch_core::dto::report::{StoredReport, UploadReceipt, UploadReport};

use crate::api::error::ApiResult;
use crate::service::report_service;
use crate::store::ReportStore;

/// PUT /api/reports/{correlation_id}
/// Create or replace the report for a correlation ID
pub async fn upload_report(
    State(store): State<ReportStore>,
    Path(correlation_id): Path<String>,
    Json(report): Json<UploadReport>,
) -> ApiResult<(StatusCode, Json<UploadReceipt>)> {
    tracing::info!(
        "Receiving report {} ({} trigger)",
        correlation_id,
        report.trigger_kind
    );

    let receipt = report_service::upload_report(&store, &correlation_id, report).await?;

    let status = if receipt.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(receipt)))
}

/// GET /api/reports
/// List all reports
pub async fn list_reports(State(store): State<ReportStore>) -> Json<Vec<StoredReport>> {
    tracing::debug!("Listing all reports");

    Json(report_service::list_reports(&store).await)
}

/// GET /api/reports/{correlation_id}
/// Get a report by correlation ID
pub async fn get_report(
    State(store): State<ReportStore>,
    Path(correlation_id): Path<String>,
) -> ApiResult<Json<StoredReport>> {
    tracing::debug!("Getting report: {}", correlation_id);

    let report = report_service::get_report(&store, &correlation_id).await?;

    Ok(Json(report))
}
