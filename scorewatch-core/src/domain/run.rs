//! Run domain types
//!
//! A run is the sequential execution of the checkout, analyze and upload
//! steps for a single [`RunRequest`](super::trigger::RunRequest).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::trigger::{RunRequest, TriggerKind};

/// The steps of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Checkout,
    Analyze,
    Upload,
}

impl StepKind {
    /// All steps in the order they must run
    pub const ORDER: [StepKind; 3] = [StepKind::Checkout, StepKind::Analyze, StepKind::Upload];
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Checkout => write!(f, "checkout"),
            StepKind::Analyze => write!(f, "analyze"),
            StepKind::Upload => write!(f, "upload"),
        }
    }
}

/// Exit status reported by the analysis step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    Success,
    Failure,
}

/// Result of the analysis step
///
/// Produced by the scan, consumed by the upload step, not retained
/// beyond the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub exit_status: ExitStatus,
    pub artifact_path: PathBuf,
}

impl RunResult {
    pub fn success(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            exit_status: ExitStatus::Success,
            artifact_path: artifact_path.into(),
        }
    }

    pub fn failure(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            exit_status: ExitStatus::Failure,
            artifact_path: artifact_path.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_status == ExitStatus::Success
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Record of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub correlation_id: String,
    pub trigger_kind: TriggerKind,
    pub status: RunStatus,
    /// Step that aborted the run, if any
    pub failed_step: Option<StepKind>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Outcome of a run where every step completed
    pub fn succeeded(request: &RunRequest, started_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: request.correlation_id().to_string(),
            trigger_kind: request.trigger_kind(),
            status: RunStatus::Succeeded,
            failed_step: None,
            error_message: None,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Outcome of a run aborted by `step`
    pub fn failed(
        request: &RunRequest,
        step: StepKind,
        error_message: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id: request.correlation_id().to_string(),
            trigger_kind: request.trigger_kind(),
            status: RunStatus::Failed,
            failed_step: Some(step),
            error_message: Some(error_message.into()),
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Process exit code for the invoking host
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Succeeded => 0,
            RunStatus::Failed => 1,
        }
    }
}
