//! External process helper
//!
//! Runs a child process to completion under a timeout and captures its
//! output. The child is killed if the timeout elapses.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished child process
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `command` and waits at most `timeout` for it to exit
///
/// # Arguments
/// * `label` - Short name used in logs and error messages
/// * `command` - Fully configured command
/// * `timeout` - Upper bound on run time
///
/// # Returns
/// The captured output, or an error if the process could not be started
/// or did not finish in time.
pub async fn run_with_timeout(
    label: &str,
    mut command: Command,
    timeout: Duration,
) -> Result<ProcessOutput> {
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .with_context(|| format!("Failed to start {}", label))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| anyhow::anyhow!("{} timed out after {:?}", label, timeout))?
        .with_context(|| format!("Failed to wait for {}", label))?;

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    debug!(
        "{} exited: exit_code={}, stdout_len={}, stderr_len={}",
        label,
        exit_code,
        output.stdout.len(),
        stderr.len()
    );

    Ok(ProcessOutput {
        stdout: output.stdout,
        stderr,
        exit_code,
    })
}
