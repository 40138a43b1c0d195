//! Scorewatch Runner
//!
//! Executes scorecard scan runs: checkout, analysis and upload of the
//! SARIF results to the ingestion endpoint.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Business logic (checkout, analysis, upload, archive, execution)
//! - Scheduler: Schedule ticker and run dispatcher
//!
//! With `SCOREWATCH_EVENT_PATH` set, the runner processes that single event
//! and exits with the run's exit code. Otherwise it stays up and runs the
//! weekly schedule until interrupted.

mod config;
mod context;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::{RunDispatcher, ScheduleTicker};
use crate::service::{
    DirectoryArchiveService, ExecutionService, GitCheckoutService, HttpUploadService,
    ScorecardAnalysisService, StandardExecutionService,
};
use scorewatch_client::IngestionClient;
use scorewatch_trigger::EventDescriptor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorewatch_runner=info,scorewatch_trigger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scorewatch Runner");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: repository_url={}, ingest_url={}, schedule='{}'",
        config.repository_url, config.ingest_url, config.schedule_cron
    );

    // Initialize ingestion client
    let mut client = IngestionClient::new(config.ingest_url.clone());
    if let Some(token) = &config.id_token {
        client = client.with_bearer_token(token.expose());
    }

    // Initialize services
    let execution = build_execution_service(&config, client.clone());
    let dispatcher = RunDispatcher::new(config.trigger_policy()?, execution);

    info!("Services initialized");

    match &config.event_path {
        Some(path) => {
            let code = run_once(&dispatcher, path).await?;
            std::process::exit(code);
        }
        None => run_daemon(&config, client, dispatcher).await,
    }
}

/// Loads configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

fn build_execution_service(config: &Config, client: IngestionClient) -> Arc<dyn ExecutionService> {
    let checkout = GitCheckoutService::new(
        config.git_bin.clone(),
        config.repository_url.clone(),
        config.repo_token.clone(),
        config.step_timeout,
    );
    let analysis = ScorecardAnalysisService::new(
        config.scorecard_bin.clone(),
        config.scan_token.clone(),
        config.step_timeout,
    );
    let upload = HttpUploadService::new(client);
    let archive =
        DirectoryArchiveService::new(config.archive_dir.clone(), config.archive_retention);

    Arc::new(
        StandardExecutionService::new(
            config.workspace_base.clone(),
            config.artifact_file.clone(),
            Arc::new(checkout),
            Arc::new(analysis),
            Arc::new(upload),
        )
        .with_archive(Arc::new(archive)),
    )
}

/// Processes a single event file
///
/// # Returns
/// The process exit code: the run's exit code, or 0 when the event does
/// not map to a run
async fn run_once(dispatcher: &RunDispatcher, path: &Path) -> Result<i32> {
    info!("Processing event file {}", path.display());

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event file {}", path.display()))?;
    let event: EventDescriptor = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse event file {}", path.display()))?;

    match dispatcher.dispatch(&event).await {
        Some(outcome) => {
            if let Some(message) = &outcome.error_message {
                error!("Run {} failed: {}", outcome.correlation_id, message);
            }
            Ok(outcome.exit_code())
        }
        None => {
            warn!("Event '{}' did not start a run", event.event_name);
            Ok(0)
        }
    }
}

/// Runs the schedule until ctrl-c
async fn run_daemon(
    config: &Config,
    client: IngestionClient,
    dispatcher: RunDispatcher,
) -> Result<()> {
    wait_for_ingest(&client).await;

    let (events_tx, events_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let ticker = ScheduleTicker::with_state_file(
        config.schedule()?,
        Utc::now(),
        events_tx,
        config.schedule_state_file.clone(),
    )
    .await;
    let ticker_handle = tokio::spawn(ticker.run(shutdown_rx));
    let dispatcher_handle = tokio::spawn(dispatcher.run(events_rx));

    info!("Runner initialized successfully");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(());

    if let Err(e) = ticker_handle.await.context("Schedule ticker panicked")? {
        error!("Schedule ticker error: {:#}", e);
    }

    // The ticker owned the only sender, so the dispatcher drains and stops
    let executed = dispatcher_handle.await.context("Dispatcher panicked")?;
    info!("Runner stopped after {} run(s)", executed);

    Ok(())
}

/// Waits for the ingestion endpoint with exponential backoff
///
/// This handles the case where the endpoint may not be ready yet when the
/// runner starts (common in container environments). An unreachable
/// endpoint is not fatal: uploads will fail and be reported per run.
async fn wait_for_ingest(client: &IngestionClient) {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match client.health().await {
            Ok(()) => {
                if attempt > 1 {
                    info!(
                        "Ingestion endpoint reachable after {} attempt(s)",
                        attempt
                    );
                }
                return;
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    warn!(
                        "Ingestion endpoint {} unreachable after {} attempts: {}",
                        client.base_url(),
                        MAX_RETRIES,
                        e
                    );
                    return;
                }

                warn!(
                    "Ingestion endpoint not ready (attempt {}/{}): {}",
                    attempt, MAX_RETRIES, e
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
