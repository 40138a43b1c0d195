//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod classify;
mod report;
mod schedule;

pub use classify::ClassifyArgs;
pub use report::ReportCommands;
pub use schedule::ScheduleCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify an event file into a run request
    Classify(ClassifyArgs),
    /// Inspect the weekly scan schedule
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Query reports held by the ingestion endpoint
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Classify(args) => classify::handle_classify_command(args).await,
        Commands::Schedule { command } => schedule::handle_schedule_command(command),
        Commands::Report { command } => report::handle_report_command(command, config).await,
    }
}
