//! Report command handlers
//!
//! Lists and shows reports held by the ingestion endpoint.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use scorewatch_client::{ClientError, IngestionClient, StoredReport};
use scorewatch_core::domain::trigger::TriggerKind;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// List all ingested reports
    List,
    /// Get report details
    Get {
        /// Correlation ID of the run
        id: String,

        /// Print the full SARIF document
        #[arg(long)]
        sarif: bool,
    },
}

/// Handle report commands
///
/// Routes report subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The report command to execute
/// * `config` - The CLI configuration
pub async fn handle_report_command(command: ReportCommands, config: &Config) -> Result<()> {
    let client = IngestionClient::new(&config.ingest_url);

    match command {
        ReportCommands::List => list_reports(&client).await,
        ReportCommands::Get { id, sarif } => get_report(&client, &id, sarif).await,
    }
}

/// List all reports
async fn list_reports(client: &IngestionClient) -> Result<()> {
    let reports = client
        .list_reports()
        .await
        .map_err(|e| explain(client.base_url(), "list reports", e))?;

    if reports.is_empty() {
        println!("{}", "No reports found.".yellow());
    } else {
        println!("{}", format!("Found {} report(s):", reports.len()).bold());
        println!();
        for report in reports {
            print_report_summary(&report);
        }
    }

    Ok(())
}

/// Get and display a single report
async fn get_report(client: &IngestionClient, id: &str, show_sarif: bool) -> Result<()> {
    let report = match client.get_report(id).await {
        Ok(report) => report,
        Err(e) if e.is_not_found() => anyhow::bail!("Report '{}' not found", id),
        Err(e) => return Err(explain(client.base_url(), "get report", e)),
    };

    print_report_details(&report);

    if show_sarif {
        println!("\n{}", "SARIF:".bold());
        println!("{}", serde_json::to_string_pretty(&report.sarif)?);
    }

    Ok(())
}

/// Words a client failure for the terminal
///
/// An unavailable endpoint is worth retrying later; a rejected request is
/// not.
fn explain(base_url: &str, action: &str, error: ClientError) -> anyhow::Error {
    if error.is_unavailable() {
        anyhow!(
            "Ingestion endpoint {} is unavailable, try again later ({})",
            base_url,
            error
        )
    } else if error.is_rejected() {
        anyhow!("Ingestion endpoint refused to {}: {}", action, error)
    } else {
        anyhow!("Failed to {}: {}", action, error)
    }
}

/// Print a report summary
fn print_report_summary(report: &StoredReport) {
    println!("  {} Report {}", "▸".cyan(), report.correlation_id.bold());
    println!("    Trigger:  {}", colorize_kind(report.trigger_kind));
    println!("    Branch:   {}", report.branch.as_deref().unwrap_or("-"));
    println!("    Results:  {}", report.result_count());
    println!(
        "    Updated:  {}",
        report
            .updated_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed report information
fn print_report_details(report: &StoredReport) {
    println!("{}", "Report Details:".bold());
    println!("  Correlation: {}", report.correlation_id.cyan());
    println!("  Trigger:     {}", colorize_kind(report.trigger_kind));
    println!("  Branch:      {}", report.branch.as_deref().unwrap_or("-"));
    println!("  Tool:        {}", report.tool);
    println!(
        "  SARIF:       {}",
        report
            .sarif
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
    );
    println!("  Results:     {}", report.result_count());
    println!("  Revision:    {}", report.revision);
    println!(
        "  Received:    {}",
        report.first_received_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        report.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
}

/// Colorize trigger kind for display
fn colorize_kind(kind: TriggerKind) -> colored::ColoredString {
    let kind_str = kind.to_string();
    match kind {
        TriggerKind::Schedule => kind_str.cyan(),
        TriggerKind::Push => kind_str.green(),
        TriggerKind::Manual => kind_str.blue(),
        TriggerKind::RuleChange => kind_str.yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:8090";

    #[test]
    fn test_server_error_is_reported_as_unavailable() {
        let error = explain(URL, "get report", ClientError::from_status(502, "bad gateway"));
        let message = error.to_string();

        assert!(message.starts_with("Ingestion endpoint http://localhost:8090 is unavailable"));
        assert!(message.contains("bad gateway"));
    }

    #[test]
    fn test_rejected_request_is_not_retryable() {
        let error = explain(URL, "list reports", ClientError::from_status(401, "no token"));
        let message = error.to_string();

        assert!(message.starts_with("Ingestion endpoint refused to list reports"));
        assert!(!message.contains("try again"));
    }

    #[test]
    fn test_other_errors_keep_the_action() {
        let error = explain(URL, "get report", ClientError::Decode("missing field".to_string()));
        assert_eq!(
            error.to_string(),
            "Failed to get report: Unexpected response body: missing field"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let client = IngestionClient::new("http://127.0.0.1:9");
        let error = get_report(&client, "manual:1", false).await.unwrap_err();
        assert!(error.to_string().contains("is unavailable"));
    }
}
