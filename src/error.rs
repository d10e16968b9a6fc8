//! Failures that end a request.
//!
//! Extraction never shows up here: a payload that cannot be interpreted
//! degrades to its string form instead of failing.

use thiserror::Error;

/// Errors surfaced by the trigger/poll half of the pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The work-intake endpoint answered with a non-success status.
    #[error("task trigger failed ({status}): {body}")]
    Trigger { status: u16, body: String },

    /// The status endpoint answered with a non-success status.
    #[error("task poll failed ({status}): {body}")]
    Poll { status: u16, body: String },

    /// The status call never produced a usable response.
    #[error("task poll failed: {0}")]
    Transport(String),

    /// Polling was abandoned by a deadline or shutdown.
    #[error("task polling cancelled")]
    Cancelled,

    /// Invalid settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RelayError {
    /// HTTP status to answer the inbound request with.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Cancelled => 503,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Transport(e.to_string())
    }
}
