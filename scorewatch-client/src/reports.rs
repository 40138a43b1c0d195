//! Report-related API endpoints

use crate::IngestionClient;
use crate::error::Result;
use scorewatch_core::dto::report::{StoredReport, UploadReceipt, UploadReport};

impl IngestionClient {
    // =============================================================================
    // Upload
    // =============================================================================

    /// Upload a report, creating or replacing the entry for its correlation ID
    ///
    /// Uploading the same correlation ID twice leaves a single entry at the
    /// endpoint with a bumped revision.
    ///
    /// # Returns
    /// The receipt telling whether the entry was created or replaced
    pub async fn upload_report(&self, report: &UploadReport) -> Result<UploadReceipt> {
        let url = self.report_url(&report.correlation_id)?;
        tracing::debug!("Uploading report {} to {}", report.correlation_id, url);

        let response = self
            .authorize(self.client.put(url))
            .json(report)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Queries
    // =============================================================================

    /// List all ingested reports
    pub async fn list_reports(&self) -> Result<Vec<StoredReport>> {
        let url = format!("{}/api/reports", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }

    /// Get a report by correlation ID
    pub async fn get_report(&self, correlation_id: &str) -> Result<StoredReport> {
        let url = self.report_url(correlation_id)?;
        let response = self.authorize(self.client.get(url)).send().await?;

        self.handle_response(response).await
    }
}
