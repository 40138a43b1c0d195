//! Errors returned by [`IngestionClient`](crate::IngestionClient)

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure talking to the ingestion endpoint
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response (connection refused, timeout, TLS)
    #[error("Could not reach the ingestion endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Ingestion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid ingestion URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The endpoint refused the request itself (4xx): retrying the same
    /// request will not help
    pub fn is_rejected(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// The endpoint is down or failing (no response, or 5xx)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport(_)) || self.status().is_some_and(|s| s >= 500)
    }
}
