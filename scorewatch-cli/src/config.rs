//! Configuration module
//!
//! Handles CLI configuration such as the ingestion endpoint URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the ingestion endpoint
    pub ingest_url: String,
}
