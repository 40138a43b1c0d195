//! Scorewatch HTTP Client
//!
//! A simple, type-safe HTTP client for the Scorewatch ingestion endpoint.
//!
//! Used by the runner to upload scan results and by the CLI to inspect
//! ingested reports.
//!
//! # Example
//!
//! ```no_run
//! use scorewatch_client::IngestionClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = IngestionClient::new("http://localhost:8090");
//!
//!     for report in client.list_reports().await? {
//!         println!("{} (revision {})", report.correlation_id, report.revision);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod reports;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use scorewatch_core::dto::report::{StoredReport, UploadReceipt, UploadReport};

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the Scorewatch ingestion API
///
/// Provides:
/// - Report upload (upsert by correlation ID)
/// - Report listing and lookup
/// - Health checks
#[derive(Debug, Clone)]
pub struct IngestionClient {
    /// Base URL of the ingestion endpoint (e.g., "http://localhost:8090")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Identity token sent as a bearer token, if any
    bearer_token: Option<String>,
}

impl IngestionClient {
    /// Create a new ingestion client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the ingestion API (e.g., "http://localhost:8090")
    ///
    /// # Example
    /// ```
    /// use scorewatch_client::IngestionClient;
    ///
    /// let client = IngestionClient::new("http://localhost:8090");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new ingestion client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use scorewatch_client::IngestionClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = IngestionClient::with_client("http://localhost:8090", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            bearer_token: None,
        }
    }

    /// Attach an identity token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Get the base URL of the ingestion endpoint
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the endpoint is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// Builds `{base}/api/reports/{correlation_id}` with the ID percent-encoded
    fn report_url(&self, correlation_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/reports", self.base_url))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot carry a path", self.base_url)))?
            .push(correlation_id);

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_status(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Handle an API response that returns no content
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_status(status.as_u16(), error_text));
        }

        Ok(())
    }
}
