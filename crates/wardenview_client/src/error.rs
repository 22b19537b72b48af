//! Errors raised inside the adapter before they become failure results.
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the remote API.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status for [`ClientError::Status`] failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
