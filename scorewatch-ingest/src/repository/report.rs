//! Report Repository
//!
//! Handles all store operations related to reports.

use chrono::Utc;
use scorewatch_core::dto::report::{StoredReport, UploadReport};

use crate::store::ReportStore;

/// Insert a report or replace the one with the same correlation ID
///
/// Returns the stored report and whether it was newly created.
pub async fn upsert(store: &ReportStore, report: UploadReport) -> (StoredReport, bool) {
    let now = Utc::now();
    let mut reports = store.reports().write().await;

    match reports.get_mut(&report.correlation_id) {
        Some(existing) => {
            existing.trigger_kind = report.trigger_kind;
            existing.branch = report.branch;
            existing.tool = report.tool;
            existing.sarif = report.sarif;
            existing.revision += 1;
            existing.updated_at = now;
            (existing.clone(), false)
        }
        None => {
            let stored = StoredReport {
                correlation_id: report.correlation_id.clone(),
                trigger_kind: report.trigger_kind,
                branch: report.branch,
                tool: report.tool,
                sarif: report.sarif,
                revision: 1,
                first_received_at: now,
                updated_at: now,
            };
            reports.insert(report.correlation_id, stored.clone());
            (stored, true)
        }
    }
}

/// Find a report by correlation ID
pub async fn find_by_id(store: &ReportStore, correlation_id: &str) -> Option<StoredReport> {
    store.reports().read().await.get(correlation_id).cloned()
}

/// List all reports, oldest first
pub async fn list_all(store: &ReportStore) -> Vec<StoredReport> {
    let mut reports: Vec<StoredReport> = store.reports().read().await.values().cloned().collect();
    reports.sort_by(|a, b| {
        a.first_received_at
            .cmp(&b.first_received_at)
            .then_with(|| a.correlation_id.cmp(&b.correlation_id))
    });
    reports
}

/// Number of stored reports
pub async fn count(store: &ReportStore) -> usize {
    store.reports().read().await.len()
}
