//! Scorewatch CLI
//!
//! Command-line interface for classifying events, previewing the scan
//! schedule and inspecting reports held by the ingestion endpoint.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "scorewatch")]
#[command(about = "Scorewatch scorecard scan CLI", long_about = None)]
struct Cli {
    /// Ingestion endpoint URL
    #[arg(
        long,
        env = "SCOREWATCH_INGEST_URL",
        default_value = "http://localhost:8090"
    )]
    ingest_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        ingest_url: cli.ingest_url,
    };

    handle_command(cli.command, &config).await
}
