//! Error types for session authorization

use thiserror::Error;

/// Why a request was refused at the session boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No token supplied
    #[error("Session token is required. Send the X-Session-Token header")]
    MissingToken,

    /// Token unknown, expired or invalidated
    #[error("Invalid or expired session")]
    InvalidOrExpired,
}

impl SessionError {
    /// Stable label, used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionError::MissingToken => "missing_token",
            SessionError::InvalidOrExpired => "invalid_or_expired",
        }
    }
}
