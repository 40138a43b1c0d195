//! Upload service
//!
//! Sends the SARIF artifact of a run to the ingestion endpoint. This is the
//! only step that needs write access, and it is attempted exactly once.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use scorewatch_client::{IngestionClient, UploadReceipt, UploadReport};
use scorewatch_core::domain::permission::StepPermissions;
use scorewatch_core::domain::run::RunResult;
use scorewatch_core::dto::report::check_sarif_shape;
use tracing::info;

use crate::context::RunContext;

/// Service trait for publishing scan results
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Uploads the artifact produced by the analysis step
    async fn upload(
        &self,
        ctx: &RunContext,
        result: &RunResult,
        permissions: StepPermissions,
    ) -> Result<UploadReceipt>;
}

/// Upload over HTTP through [`IngestionClient`]
pub struct HttpUploadService {
    client: IngestionClient,
}

impl HttpUploadService {
    pub fn new(client: IngestionClient) -> Self {
        Self { client }
    }
}

/// Reads and validates a SARIF artifact
pub async fn read_artifact(result: &RunResult) -> Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(&result.artifact_path)
        .await
        .with_context(|| format!("Failed to read {}", result.artifact_path.display()))?;

    let sarif: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", result.artifact_path.display()))?;

    check_sarif_shape(&sarif).map_err(|reason| anyhow::anyhow!("Invalid SARIF: {}", reason))?;

    Ok(sarif)
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn upload(
        &self,
        ctx: &RunContext,
        result: &RunResult,
        permissions: StepPermissions,
    ) -> Result<UploadReceipt> {
        if !permissions.can_write_security_events() {
            bail!("Upload requires write access to security events");
        }

        if !result.is_success() {
            bail!("Refusing to upload the artifact of a failed scan");
        }

        let sarif = read_artifact(result).await?;
        let report = UploadReport::for_request(ctx.request(), sarif);

        let receipt = self
            .client
            .upload_report(&report)
            .await
            .with_context(|| format!("Failed to upload report {}", ctx.correlation_id()))?;

        info!(
            "Uploaded report {} to {} ({}, revision {})",
            receipt.correlation_id,
            self.client.base_url(),
            if receipt.created { "created" } else { "replaced" },
            receipt.revision
        );

        Ok(receipt)
    }
}
