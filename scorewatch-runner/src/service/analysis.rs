//! Analysis service
//!
//! Runs the scorecard scan over the checked-out tree and writes its SARIF
//! output to the run's artifact path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scorewatch_core::domain::permission::StepPermissions;
use scorewatch_core::domain::run::RunResult;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Credential;
use crate::context::RunContext;
use crate::service::process::run_with_timeout;

/// Service trait for the security scan
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Scans the checked-out tree
    ///
    /// # Returns
    /// The scan result. A failed scan is reported through
    /// `RunResult::exit_status`; an `Err` means the scan could not run.
    async fn analyze(
        &self,
        ctx: &RunContext,
        checkout_dir: &Path,
        permissions: StepPermissions,
    ) -> Result<RunResult>;
}

/// Analysis through the `scorecard` binary
pub struct ScorecardAnalysisService {
    scorecard_bin: String,
    token: Option<Credential>,
    timeout: Duration,
}

impl ScorecardAnalysisService {
    pub fn new(
        scorecard_bin: impl Into<String>,
        token: Option<Credential>,
        timeout: Duration,
    ) -> Self {
        Self {
            scorecard_bin: scorecard_bin.into(),
            token,
            timeout,
        }
    }

    fn scan_args(&self, checkout_dir: &Path) -> Vec<String> {
        vec![
            format!("--local={}", checkout_dir.display()),
            "--format=sarif".to_string(),
            "--show-details".to_string(),
        ]
    }
}

#[async_trait]
impl AnalysisService for ScorecardAnalysisService {
    async fn analyze(
        &self,
        ctx: &RunContext,
        checkout_dir: &Path,
        permissions: StepPermissions,
    ) -> Result<RunResult> {
        if permissions.is_elevated() {
            warn!(
                "Analysis for {} was granted elevated permissions; ignoring them",
                ctx.correlation_id()
            );
        }

        info!("Running scorecard on {}", checkout_dir.display());

        let mut command = Command::new(&self.scorecard_bin);
        command
            .args(self.scan_args(checkout_dir))
            .current_dir(checkout_dir)
            .env_remove("GITHUB_AUTH_TOKEN");

        if let Some(token) = &self.token {
            command.env("GITHUB_AUTH_TOKEN", token.expose());
        }

        let output = run_with_timeout("scorecard", command, self.timeout).await?;

        tokio::fs::write(ctx.artifact_path(), &output.stdout)
            .await
            .with_context(|| format!("Failed to write {}", ctx.artifact_path().display()))?;

        if !output.success() {
            warn!(
                "scorecard failed: exit_code={}, stderr='{}'",
                output.exit_code,
                output.stderr.trim()
            );
            return Ok(RunResult::failure(ctx.artifact_path()));
        }

        info!(
            "scorecard wrote {} bytes to {}",
            output.stdout.len(),
            ctx.artifact_path().display()
        );

        Ok(RunResult::success(ctx.artifact_path()))
    }
}
