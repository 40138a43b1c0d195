//! Classify command handler
//!
//! Runs an event file through the trigger policy and shows the run request
//! it produces, or why it produces none.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::*;
use std::path::PathBuf;

use scorewatch_trigger::{
    DEFAULT_SCHEDULE, EventDescriptor, RunRequest, TriggerPolicy, WeeklySchedule,
};

/// Arguments of `scorewatch classify`
#[derive(Args)]
pub struct ClassifyArgs {
    /// Path to the event JSON file
    pub event: PathBuf,

    /// Branch whose pushes start a run (repeatable)
    #[arg(long = "branch", default_value = "main")]
    pub branches: Vec<String>,

    /// Branch used when the event names none
    #[arg(long, default_value = "main")]
    pub default_branch: String,

    /// Configured weekly cron expression
    #[arg(long, env = "SCOREWATCH_SCHEDULE", default_value = DEFAULT_SCHEDULE)]
    pub cron: String,

    /// Evaluate as of this RFC 3339 time instead of now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Handle the classify command
///
/// Fails when the event does not map to a run, so scripts can rely on
/// the exit status. The reason is reported once, by the returned error.
pub async fn handle_classify_command(args: ClassifyArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.event)
        .await
        .with_context(|| format!("Failed to read {}", args.event.display()))?;

    let policy = build_policy(&args)?;
    let now = args.at.unwrap_or_else(Utc::now);

    let request = classify_event(&raw, &policy, now)
        .with_context(|| format!("No run for {}", args.event.display()))?;
    print_request(&request);

    Ok(())
}

fn build_policy(args: &ClassifyArgs) -> Result<TriggerPolicy> {
    let schedule = WeeklySchedule::parse(&args.cron)
        .with_context(|| format!("Invalid schedule '{}'", args.cron))?;

    Ok(TriggerPolicy::new(schedule)
        .with_push_branches(args.branches.iter().cloned())
        .with_default_branch(args.default_branch.clone()))
}

/// Parses and classifies a raw event document
fn classify_event(raw: &str, policy: &TriggerPolicy, now: DateTime<Utc>) -> Result<RunRequest> {
    let event: EventDescriptor =
        serde_json::from_str(raw).context("Event file is not a valid event descriptor")?;

    Ok(policy.classify_at(&event, now)?)
}

/// Print a run request
fn print_request(request: &RunRequest) {
    println!("{}", "Run Request:".bold());
    println!("  Trigger:     {}", request.trigger_kind().to_string().cyan());
    println!("  Branch:      {}", request.branch().unwrap_or("-"));
    println!("  Correlation: {}", request.correlation_id().bold());
    println!("  Reason:      {}", request.reason().dimmed());
}
