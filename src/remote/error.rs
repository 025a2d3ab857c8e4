use thiserror::Error;

use crate::job::models::JobId;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to jobs service timed out")]
    Timeout,

    #[error("Jobs service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Failed to decode jobs service response: {0}")]
    Decode(String),

    #[error("Invalid jobs service URL: {0}")]
    InvalidBaseUrl(String),
}

impl RemoteError {
    /// Failures worth another attempt: transport trouble and 5xx responses
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) | RemoteError::Timeout => true,
            RemoteError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}
