//! Report Service
//!
//! Business logic for report ingestion.

use scorewatch_core::dto::report::{StoredReport, UploadReceipt, UploadReport, check_sarif_shape};

use crate::repository::report_repository;
use crate::store::ReportStore;

/// Service error type
#[derive(Debug)]
pub enum ReportError {
    NotFound(String),
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Ingest a report for `correlation_id`
///
/// Upserts by correlation ID: re-uploading the same run replaces the
/// previous content instead of adding an entry.
pub async fn upload_report(
    store: &ReportStore,
    correlation_id: &str,
    report: UploadReport,
) -> Result<UploadReceipt> {
    validate_upload(correlation_id, &report)?;

    let (stored, created) = report_repository::upsert(store, report).await;

    if created {
        tracing::info!("Report created: {}", stored.correlation_id);
    } else {
        tracing::info!(
            "Report replaced: {} (revision {})",
            stored.correlation_id,
            stored.revision
        );
    }

    Ok(UploadReceipt {
        correlation_id: stored.correlation_id,
        created,
        revision: stored.revision,
    })
}

/// Get a report by correlation ID
pub async fn get_report(store: &ReportStore, correlation_id: &str) -> Result<StoredReport> {
    report_repository::find_by_id(store, correlation_id)
        .await
        .ok_or_else(|| ReportError::NotFound(correlation_id.to_string()))
}

/// List all reports
pub async fn list_reports(store: &ReportStore) -> Vec<StoredReport> {
    report_repository::list_all(store).await
}

/// Number of reports held
pub async fn count_reports(store: &ReportStore) -> usize {
    report_repository::count(store).await
}

// =============================================================================
// Validation
// =============================================================================

fn validate_upload(correlation_id: &str, report: &UploadReport) -> Result<()> {
    if correlation_id.trim().is_empty() {
        return Err(ReportError::ValidationError(
            "Correlation ID cannot be empty".to_string(),
        ));
    }

    if report.correlation_id != correlation_id {
        return Err(ReportError::ValidationError(format!(
            "Correlation ID mismatch: path '{}' vs body '{}'",
            correlation_id, report.correlation_id
        )));
    }

    validate_sarif(&report.sarif)
}

fn validate_sarif(sarif: &serde_json::Value) -> Result<()> {
    check_sarif_shape(sarif).map_err(ReportError::ValidationError)
}
