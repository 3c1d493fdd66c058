//! Mimir error types

use std::time::Duration;

/// Mimir error types
///
/// `Clone` so that one settled result can be handed to every caller waiting
/// on the same in-flight request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MimirError {
    // Transport/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Non-success response carrying a server-written `error` explanation.
    #[error("request rejected ({status}): {error}")]
    Rejected { status: u16, error: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The single automatic retry after a rate limit also failed.
    #[error("retry after rate limit failed: {last}")]
    RetryExhausted { last: Box<MimirError> },

    /// Server signalled degraded operation (HTTP 503 with `fallback_mode`).
    #[error("service in fallback mode: {error}")]
    Fallback {
        error: String,
        details: Option<String>,
    },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("resource not found")]
    NotFound,

    // Orchestration outcomes
    #[error("request cancelled")]
    Cancelled,

    #[error("request throttled")]
    Throttled,

    #[error("request superseded by a newer call")]
    Superseded,

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration / local state
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),
}

impl MimirError {
    /// Whether the error is worth an automatic retry.
    ///
    /// Only rate limiting qualifies. Server overload with `fallback_mode`
    /// is a degraded answer, not a transient failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, MimirError::RateLimited { .. })
    }

    /// Server-provided `Retry-After` hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MimirError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Outcomes that are not failures and must never be logged as errors.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            MimirError::Cancelled | MimirError::Throttled | MimirError::Superseded
        )
    }
}

impl From<serde_json::Error> for MimirError {
    fn from(err: serde_json::Error) -> Self {
        MimirError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for MimirError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MimirError::Json(err.to_string())
        } else {
            MimirError::Http(err.to_string())
        }
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
