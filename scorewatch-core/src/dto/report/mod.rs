//! Report DTOs exchanged with the ingestion endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::trigger::{RunRequest, TriggerKind};

/// Name reported as the producing tool when none is given
pub const DEFAULT_TOOL: &str = "scorecard";

/// SARIF results uploaded by the runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub correlation_id: String,
    pub trigger_kind: TriggerKind,
    pub branch: Option<String>,
    #[serde(default = "default_tool")]
    pub tool: String,
    pub sarif: serde_json::Value,
}

fn default_tool() -> String {
    DEFAULT_TOOL.to_string()
}

impl UploadReport {
    /// Builds the upload payload for a run request
    pub fn for_request(request: &RunRequest, sarif: serde_json::Value) -> Self {
        Self {
            correlation_id: request.correlation_id().to_string(),
            trigger_kind: request.trigger_kind(),
            branch: request.branch().map(str::to_string),
            tool: default_tool(),
            sarif,
        }
    }
}

/// A report as held by the ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub correlation_id: String,
    pub trigger_kind: TriggerKind,
    pub branch: Option<String>,
    pub tool: String,
    pub sarif: serde_json::Value,
    /// Number of uploads received for this correlation ID
    pub revision: u32,
    pub first_received_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredReport {
    /// Number of SARIF results across all runs
    pub fn result_count(&self) -> usize {
        self.sarif
            .get("runs")
            .and_then(|runs| runs.as_array())
            .map(|runs| {
                runs.iter()
                    .filter_map(|run| run.get("results").and_then(|r| r.as_array()))
                    .map(|results| results.len())
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// Checks the top-level SARIF shape: an object with a `version` string
/// and a `runs` array
///
/// Returns a human-readable reason when the shape is wrong.
pub fn check_sarif_shape(sarif: &serde_json::Value) -> Result<(), String> {
    let object = sarif
        .as_object()
        .ok_or_else(|| "SARIF must be a JSON object".to_string())?;

    if !object.get("version").is_some_and(|v| v.is_string()) {
        return Err("SARIF is missing a 'version' string".to_string());
    }

    if !object.get("runs").is_some_and(|v| v.is_array()) {
        return Err("SARIF is missing a 'runs' array".to_string());
    }

    Ok(())
}

/// Response to an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub correlation_id: String,
    /// True when this upload created the entry, false when it replaced one
    pub created: bool,
    pub revision: u32,
}
