//! Error types for risk engine

use std::time::Duration;
use thiserror::Error;

/// Failure of a single remote classification attempt
#[derive(Debug, Error)]
pub enum Error {
    /// Connection or transport level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Attempt did not complete within the time budget
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Remote service answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Anything else, including a classifier that panicked
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether another attempt may succeed where this one failed.
    ///
    /// Only transport failures and timeouts qualify; a malformed body or an
    /// unexpected status will not change on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
