//! Archive service
//!
//! Keeps a copy of each run's artifact for a retention period. Archiving is
//! a convenience for later inspection; callers treat its errors as
//! warnings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::context::{RunContext, workspace_dir_name};

/// Service trait for artifact retention
#[async_trait]
pub trait ArchiveService: Send + Sync {
    /// Copies the run's artifact into the archive
    ///
    /// # Returns
    /// Path of the archived copy
    async fn archive(&self, ctx: &RunContext) -> Result<PathBuf>;

    /// Deletes archived artifacts older than the retention period
    ///
    /// # Returns
    /// Number of files removed
    async fn prune(&self, now: SystemTime) -> Result<usize>;
}

/// Archive in a local directory
pub struct DirectoryArchiveService {
    dir: PathBuf,
    retention: Duration,
}

impl DirectoryArchiveService {
    pub fn new(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }
}

#[async_trait]
impl ArchiveService for DirectoryArchiveService {
    async fn archive(&self, ctx: &RunContext) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let target = self
            .dir
            .join(format!("{}.sarif", workspace_dir_name(ctx.correlation_id())));

        tokio::fs::copy(ctx.artifact_path(), &target)
            .await
            .with_context(|| format!("Failed to archive {}", ctx.artifact_path().display()))?;

        debug!("Archived artifact to {}", target.display());
        Ok(target)
    }

    async fn prune(&self, now: SystemTime) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.dir.display()));
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sarif") {
                continue;
            }

            let modified = entry.metadata().await?.modified()?;
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);

            if age > self.retention {
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Pruned {} archived artifact(s)", removed);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorewatch_trigger::{RunRequest, TriggerKind};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    async fn context_with_artifact(base: &std::path::Path, id: &str) -> RunContext {
        let request = RunRequest::new(TriggerKind::Schedule, Some("main".to_string()), id, "test");
        let ctx = RunContext::new(request, base, "results.sarif");
        ctx.prepare().await.unwrap();
        tokio::fs::write(ctx.artifact_path(), r#"{"version":"2.1.0","runs":[]}"#)
            .await
            .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_archive_copies_artifact() {
        let workspace = tempfile::tempdir().unwrap();
        let archive_dir = tempfile::tempdir().unwrap();
        let ctx = context_with_artifact(workspace.path(), "schedule:42").await;

        let service = DirectoryArchiveService::new(archive_dir.path(), 5 * DAY);
        let archived = service.archive(&ctx).await.unwrap();

        assert_eq!(archived, archive_dir.path().join("schedule:42.sarif"));
        let content = tokio::fs::read_to_string(&archived).await.unwrap();
        assert!(content.contains("2.1.0"));
    }

    #[tokio::test]
    async fn test_prune_respects_retention() {
        let workspace = tempfile::tempdir().unwrap();
        let archive_dir = tempfile::tempdir().unwrap();
        let ctx = context_with_artifact(workspace.path(), "schedule:42").await;

        let service = DirectoryArchiveService::new(archive_dir.path(), 5 * DAY);
        let archived = service.archive(&ctx).await.unwrap();

        let now = SystemTime::now();
        assert_eq!(service.prune(now + DAY).await.unwrap(), 0);
        assert!(archived.exists());

        assert_eq!(service.prune(now + 6 * DAY).await.unwrap(), 1);
        assert!(!archived.exists());
    }

    #[tokio::test]
    async fn test_prune_ignores_other_files_and_missing_dir() {
        let archive_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(archive_dir.path().join("notes.txt"), "keep")
            .await
            .unwrap();

        let service = DirectoryArchiveService::new(archive_dir.path(), DAY);
        assert_eq!(service.prune(SystemTime::now() + 30 * DAY).await.unwrap(), 0);
        assert!(archive_dir.path().join("notes.txt").exists());

        let missing = DirectoryArchiveService::new(archive_dir.path().join("missing"), DAY);
        assert_eq!(missing.prune(SystemTime::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_archive_without_artifact_fails() {
        let workspace = tempfile::tempdir().unwrap();
        let archive_dir = tempfile::tempdir().unwrap();
        let request = RunRequest::new(TriggerKind::Manual, None, "manual:1", "test");
        let ctx = RunContext::new(request, workspace.path(), "results.sarif");

        let service = DirectoryArchiveService::new(archive_dir.path(), DAY);
        assert!(service.archive(&ctx).await.is_err());
    }
}
