//! Checkout service
//!
//! Fetches the repository at the requested branch into the run workspace.
//! The clone is shallow and the content token is passed through the
//! process environment only, so it is never written to `.git/config`.

use anyhow::{Result, bail};
use async_trait::async_trait;
use scorewatch_core::domain::permission::{Permission, StepPermissions};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::config::Credential;
use crate::context::RunContext;
use crate::service::process::run_with_timeout;

/// Service trait for fetching the repository
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Checks out the branch of the run request
    ///
    /// # Returns
    /// The directory containing the checked-out tree
    async fn checkout(&self, ctx: &RunContext, permissions: StepPermissions) -> Result<PathBuf>;
}

/// Checkout through the `git` command line
pub struct GitCheckoutService {
    git_bin: String,
    repository_url: String,
    token: Option<Credential>,
    timeout: Duration,
}

impl GitCheckoutService {
    pub fn new(
        git_bin: impl Into<String>,
        repository_url: impl Into<String>,
        token: Option<Credential>,
        timeout: Duration,
    ) -> Self {
        Self {
            git_bin: git_bin.into(),
            repository_url: repository_url.into(),
            token,
            timeout,
        }
    }

    /// Arguments for a shallow single-branch clone
    fn clone_args(&self, branch: &str, target: &str) -> Vec<String> {
        vec![
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            "--single-branch".to_string(),
            "--branch".to_string(),
            branch.to_string(),
            "--".to_string(),
            self.repository_url.clone(),
            target.to_string(),
        ]
    }

    /// Environment for the clone: the token travels as a one-off config
    /// entry, never as part of the URL or arguments
    fn clone_env(&self) -> Vec<(String, String)> {
        let mut env = vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())];

        if let Some(token) = &self.token {
            env.push(("GIT_CONFIG_COUNT".to_string(), "1".to_string()));
            env.push(("GIT_CONFIG_KEY_0".to_string(), "http.extraHeader".to_string()));
            env.push((
                "GIT_CONFIG_VALUE_0".to_string(),
                format!("Authorization: Bearer {}", token.expose()),
            ));
        }

        env
    }
}

#[async_trait]
impl CheckoutService for GitCheckoutService {
    async fn checkout(&self, ctx: &RunContext, permissions: StepPermissions) -> Result<PathBuf> {
        if permissions.contents < Permission::Read {
            bail!("Checkout requires read access to repository contents");
        }

        let branch = ctx
            .request()
            .branch()
            .ok_or_else(|| anyhow::anyhow!("Run request has no branch to check out"))?;
        let target = ctx.checkout_dir();

        info!(
            "Checking out {} at branch {} into {}",
            self.repository_url,
            branch,
            target.display()
        );

        let mut command = Command::new(&self.git_bin);
        command
            .args(self.clone_args(branch, &target.to_string_lossy()))
            .envs(self.clone_env());

        let output = run_with_timeout("git clone", command, self.timeout).await?;

        if !output.success() {
            bail!(
                "git clone failed: exit_code={}, stderr='{}'",
                output.exit_code,
                output.stderr.trim()
            );
        }

        Ok(target)
    }
}
