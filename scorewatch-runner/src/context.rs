//! Execution context for a single run
//!
//! Contains all state needed while a run executes:
//! - The immutable run request
//! - The workspace directory, named after the correlation ID
//! - The fixed artifact path inside that workspace

use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use scorewatch_trigger::RunRequest;

/// Per-run context shared by the steps of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    request: RunRequest,
    workspace: PathBuf,
    artifact_path: PathBuf,
}

impl RunContext {
    /// Creates a new run context
    ///
    /// # Arguments
    /// * `request` - The run request being executed
    /// * `workspace_base` - Base directory for workspaces (e.g., /tmp/scorewatch)
    /// * `artifact_file` - File name of the SARIF artifact
    pub fn new(request: RunRequest, workspace_base: &Path, artifact_file: &str) -> Self {
        let workspace = workspace_base.join(workspace_dir_name(request.correlation_id()));
        let artifact_path = workspace.join(artifact_file);

        Self {
            request,
            workspace,
            artifact_path,
        }
    }

    pub fn request(&self) -> &RunRequest {
        &self.request
    }

    pub fn correlation_id(&self) -> &str {
        self.request.correlation_id()
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Directory the repository is checked out into
    pub fn checkout_dir(&self) -> PathBuf {
        self.workspace.join("repo")
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Creates an empty workspace, clearing leftovers from an earlier
    /// attempt with the same correlation ID
    pub async fn prepare(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.workspace).await.unwrap_or(false) {
            debug!("Clearing stale workspace {}", self.workspace.display());
            tokio::fs::remove_dir_all(&self.workspace)
                .await
                .with_context(|| format!("Failed to clear {}", self.workspace.display()))?;
        }

        tokio::fs::create_dir_all(&self.workspace)
            .await
            .with_context(|| format!("Failed to create {}", self.workspace.display()))?;

        Ok(())
    }

    /// Removes the workspace
    pub async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.workspace).await {
            warn!(
                "Failed to remove workspace {}: {}",
                self.workspace.display(),
                e
            );
        }
    }
}

/// File-system safe directory name for a correlation ID
pub fn workspace_dir_name(correlation_id: &str) -> String {
    let name: String = correlation_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        format!("run_{}", name.len())
    } else {
        name
    }
}
