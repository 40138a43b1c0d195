//! Execution service
//!
//! Handles run execution including:
//! - Preparing the per-run workspace
//! - Running checkout, analysis and upload one by one
//! - Handing each step only the permissions it needs
//!
//! The first failing step aborts the run. Nothing is retried.

use async_trait::async_trait;
use chrono::Utc;
use scorewatch_core::domain::permission::StepPermissions;
use scorewatch_core::domain::run::{RunOutcome, StepKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use scorewatch_trigger::RunRequest;

use crate::context::RunContext;
use crate::service::analysis::AnalysisService;
use crate::service::archive::ArchiveService;
use crate::service::checkout::CheckoutService;
use crate::service::upload::UploadService;

/// Service trait for executing runs
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Executes a run request to completion
    ///
    /// Step failures are reported in the returned outcome, never as a panic
    /// or error.
    async fn execute(&self, request: RunRequest) -> RunOutcome;
}

/// Standard implementation of ExecutionService
pub struct StandardExecutionService {
    workspace_base: PathBuf,
    artifact_file: String,
    checkout: Arc<dyn CheckoutService>,
    analysis: Arc<dyn AnalysisService>,
    upload: Arc<dyn UploadService>,
    archive: Option<Arc<dyn ArchiveService>>,
}

impl StandardExecutionService {
    /// Creates a new standard execution service
    pub fn new(
        workspace_base: impl Into<PathBuf>,
        artifact_file: impl Into<String>,
        checkout: Arc<dyn CheckoutService>,
        analysis: Arc<dyn AnalysisService>,
        upload: Arc<dyn UploadService>,
    ) -> Self {
        Self {
            workspace_base: workspace_base.into(),
            artifact_file: artifact_file.into(),
            checkout,
            analysis,
            upload,
            archive: None,
        }
    }

    /// Retains artifacts through `archive`
    pub fn with_archive(mut self, archive: Arc<dyn ArchiveService>) -> Self {
        self.archive = Some(archive);
        self
    }

    fn permissions(ctx: &RunContext, step: StepKind) -> StepPermissions {
        let permissions = StepPermissions::for_step(step);
        debug!(
            "Run {} step {} permissions: {:?}",
            ctx.correlation_id(),
            step,
            permissions
        );
        permissions
    }

    async fn archive_artifact(&self, ctx: &RunContext) {
        let Some(archive) = &self.archive else {
            return;
        };

        if let Err(e) = archive.archive(ctx).await {
            warn!("Failed to archive artifact for {}: {:#}", ctx.correlation_id(), e);
        }

        if let Err(e) = archive.prune(SystemTime::now()).await {
            warn!("Failed to prune archived artifacts: {:#}", e);
        }
    }

    async fn run_steps(&self, ctx: &RunContext) -> Result<(), (StepKind, String)> {
        // Checkout
        ctx.prepare()
            .await
            .map_err(|e| (StepKind::Checkout, format!("{:#}", e)))?;

        let checkout_dir = self
            .checkout
            .checkout(ctx, Self::permissions(ctx, StepKind::Checkout))
            .await
            .map_err(|e| (StepKind::Checkout, format!("{:#}", e)))?;

        // Analyze
        let result = self
            .analysis
            .analyze(ctx, &checkout_dir, Self::permissions(ctx, StepKind::Analyze))
            .await
            .map_err(|e| (StepKind::Analyze, format!("{:#}", e)))?;

        self.archive_artifact(ctx).await;

        if !result.is_success() {
            return Err((StepKind::Analyze, "Scan reported failure".to_string()));
        }

        // Upload, attempted once
        self.upload
            .upload(ctx, &result, Self::permissions(ctx, StepKind::Upload))
            .await
            .map_err(|e| (StepKind::Upload, format!("{:#}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl ExecutionService for StandardExecutionService {
    async fn execute(&self, request: RunRequest) -> RunOutcome {
        let started_at = Utc::now();
        let ctx = RunContext::new(request, &self.workspace_base, &self.artifact_file);

        info!(
            "Starting run {} ({}, branch {}): {}",
            ctx.correlation_id(),
            ctx.request().trigger_kind(),
            ctx.request().branch().unwrap_or("-"),
            ctx.request().reason()
        );

        let outcome = match self.run_steps(&ctx).await {
            Ok(()) => {
                info!("Run {} succeeded", ctx.correlation_id());
                RunOutcome::succeeded(ctx.request(), started_at)
            }
            Err((step, message)) => {
                error!(
                    "Run {} failed at step {}: {}",
                    ctx.correlation_id(),
                    step,
                    message
                );
                RunOutcome::failed(ctx.request(), step, message, started_at)
            }
        };

        ctx.cleanup().await;
        outcome
    }
}
