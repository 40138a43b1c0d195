//! Runner configuration
//!
//! Defines all configurable parameters for the runner including the
//! repository to scan, the trigger policy, step timeouts, artifact
//! retention and the ingestion endpoint connection settings.

use std::path::PathBuf;
use std::time::Duration;

use scorewatch_trigger::{DEFAULT_SCHEDULE, TriggerPolicy, WeeklySchedule};

/// Opaque secret passed to a single step
///
/// The value never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for handing to a child process or HTTP client
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Runner configuration
///
/// All timeouts and paths are configurable to allow tuning for different
/// deployment scenarios (local runs vs hosted runners).
#[derive(Debug, Clone)]
pub struct Config {
    /// Clone URL of the repository to scan
    pub repository_url: String,

    /// Ingestion endpoint base URL (e.g., "http://localhost:8090")
    pub ingest_url: String,

    /// Base directory for per-run workspaces
    pub workspace_base: PathBuf,

    /// File name of the SARIF artifact inside a run workspace
    pub artifact_file: String,

    /// Weekly cron expression (5 fields, UTC)
    pub schedule_cron: String,

    /// File remembering the last fired schedule tick across restarts
    pub schedule_state_file: PathBuf,

    /// Branches whose pushes start a run
    pub push_branches: Vec<String>,

    /// Branch scanned by schedule, manual and rule-change runs
    pub default_branch: String,

    /// Maximum time a single external step may run
    pub step_timeout: Duration,

    /// Where artifact copies are retained
    pub archive_dir: PathBuf,

    /// How long archived artifacts are kept
    pub archive_retention: Duration,

    /// Path to the git binary
    pub git_bin: String,

    /// Path to the scorecard binary
    pub scorecard_bin: String,

    /// Repository content token, used by checkout only
    pub repo_token: Option<Credential>,

    /// Scanning-provider token, used by analysis only
    pub scan_token: Option<Credential>,

    /// Identity token, used by upload only
    pub id_token: Option<Credential>,

    /// Event file to process once; daemon mode when unset
    pub event_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(repository_url: String, ingest_url: String) -> Self {
        Self {
            repository_url,
            ingest_url,
            workspace_base: std::env::temp_dir().join("scorewatch"),
            artifact_file: "results.sarif".to_string(),
            schedule_cron: DEFAULT_SCHEDULE.to_string(),
            schedule_state_file: std::env::temp_dir().join("scorewatch-schedule.last"),
            push_branches: vec!["main".to_string()],
            default_branch: "main".to_string(),
            step_timeout: Duration::from_secs(600), // 10 minutes
            archive_dir: std::env::temp_dir().join("scorewatch-archive"),
            archive_retention: Duration::from_secs(5 * 24 * 60 * 60), // 5 days
            git_bin: "git".to_string(),
            scorecard_bin: "scorecard".to_string(),
            repo_token: None,
            scan_token: None,
            id_token: None,
            event_path: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SCOREWATCH_REPO_URL (required)
    /// - SCOREWATCH_INGEST_URL (optional, default: http://localhost:8090)
    /// - SCOREWATCH_WORKSPACE_DIR (optional, default: <tmp>/scorewatch)
    /// - SCOREWATCH_ARTIFACT_FILE (optional, default: results.sarif)
    /// - SCOREWATCH_SCHEDULE (optional, default: "0 1 * * 1")
    /// - SCOREWATCH_SCHEDULE_STATE (optional, default: <tmp>/scorewatch-schedule.last)
    /// - SCOREWATCH_PUSH_BRANCHES (optional, comma separated, default: main)
    /// - SCOREWATCH_DEFAULT_BRANCH (optional, default: main)
    /// - SCOREWATCH_STEP_TIMEOUT (optional, seconds, default: 600)
    /// - SCOREWATCH_ARCHIVE_DIR (optional, default: <tmp>/scorewatch-archive)
    /// - SCOREWATCH_ARCHIVE_RETENTION_DAYS (optional, default: 5)
    /// - SCOREWATCH_GIT_BIN / SCOREWATCH_SCORECARD_BIN (optional)
    /// - SCOREWATCH_REPO_TOKEN, SCOREWATCH_SCAN_TOKEN, SCOREWATCH_ID_TOKEN (optional)
    /// - SCOREWATCH_EVENT_PATH (optional, enables one-shot mode)
    pub fn from_env() -> anyhow::Result<Self> {
        let repository_url = std::env::var("SCOREWATCH_REPO_URL")
            .map_err(|_| anyhow::anyhow!("SCOREWATCH_REPO_URL environment variable not set"))?;

        let ingest_url = std::env::var("SCOREWATCH_INGEST_URL")
            .unwrap_or_else(|_| "http://localhost:8090".to_string());

        let mut config = Self::new(repository_url, ingest_url);

        if let Ok(dir) = std::env::var("SCOREWATCH_WORKSPACE_DIR") {
            config.workspace_base = PathBuf::from(dir);
        }

        if let Ok(file) = std::env::var("SCOREWATCH_ARTIFACT_FILE") {
            config.artifact_file = file;
        }

        if let Ok(cron) = std::env::var("SCOREWATCH_SCHEDULE") {
            config.schedule_cron = cron;
        }

        if let Ok(path) = std::env::var("SCOREWATCH_SCHEDULE_STATE") {
            config.schedule_state_file = PathBuf::from(path);
        }

        if let Ok(branches) = std::env::var("SCOREWATCH_PUSH_BRANCHES") {
            config.push_branches = parse_list(&branches);
        }

        if let Ok(branch) = std::env::var("SCOREWATCH_DEFAULT_BRANCH") {
            config.default_branch = branch;
        }

        config.step_timeout = std::env::var("SCOREWATCH_STEP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.step_timeout);

        if let Ok(dir) = std::env::var("SCOREWATCH_ARCHIVE_DIR") {
            config.archive_dir = PathBuf::from(dir);
        }

        config.archive_retention = std::env::var("SCOREWATCH_ARCHIVE_RETENTION_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|days| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or(config.archive_retention);

        if let Ok(bin) = std::env::var("SCOREWATCH_GIT_BIN") {
            config.git_bin = bin;
        }

        if let Ok(bin) = std::env::var("SCOREWATCH_SCORECARD_BIN") {
            config.scorecard_bin = bin;
        }

        config.repo_token = credential_from_env("SCOREWATCH_REPO_TOKEN");
        config.scan_token = credential_from_env("SCOREWATCH_SCAN_TOKEN");
        config.id_token = credential_from_env("SCOREWATCH_ID_TOKEN");

        config.event_path = std::env::var("SCOREWATCH_EVENT_PATH").ok().map(PathBuf::from);

        Ok(config)
    }

    /// Sets the push branches
    #[allow(dead_code)]
    pub fn with_push_branches(mut self, branches: Vec<String>) -> Self {
        self.push_branches = branches;
        self
    }

    /// Parses the configured schedule
    pub fn schedule(&self) -> anyhow::Result<WeeklySchedule> {
        WeeklySchedule::parse(&self.schedule_cron)
            .map_err(|e| anyhow::anyhow!("Invalid schedule '{}': {}", self.schedule_cron, e))
    }

    /// Builds the trigger policy from the schedule and branch settings
    pub fn trigger_policy(&self) -> anyhow::Result<TriggerPolicy> {
        Ok(TriggerPolicy::new(self.schedule()?)
            .with_push_branches(self.push_branches.iter().cloned())
            .with_default_branch(self.default_branch.clone()))
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.repository_url.is_empty() {
            anyhow::bail!("repository_url cannot be empty");
        }

        if self.ingest_url.is_empty() {
            anyhow::bail!("ingest_url cannot be empty");
        }

        if !self.ingest_url.starts_with("http://") && !self.ingest_url.starts_with("https://") {
            anyhow::bail!("ingest_url must start with http:// or https://");
        }

        if self.artifact_file.is_empty() || self.artifact_file.contains('/') {
            anyhow::bail!("artifact_file must be a plain file name");
        }

        self.schedule()?;

        if self.push_branches.is_empty() {
            anyhow::bail!("push_branches cannot be empty");
        }

        if self.default_branch.is_empty() {
            anyhow::bail!("default_branch cannot be empty");
        }

        if self.step_timeout.as_secs() == 0 {
            anyhow::bail!("step_timeout must be greater than 0");
        }

        if self.archive_retention.as_secs() == 0 {
            anyhow::bail!("archive_retention must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "https://github.com/example/repo.git".to_string(),
            "http://localhost:8090".to_string(),
        )
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn credential_from_env(name: &str) -> Option<Credential> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Credential::new)
}
