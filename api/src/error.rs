//! Error types for the Ghumly API client

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when calling the Ghumly backend API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying HTTP client could not be constructed
    #[error("HTTP client construction failed: {0}")]
    ClientBuild(String),

    /// Transport-level failure (connection refused, DNS, TLS, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// Request exceeded its configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Unauthorized - missing or expired credentials
    #[error("Unauthorized - missing or expired credentials")]
    Unauthorized,

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Backend returned a non-2xx response
    #[error("Request failed (status {status}): {body}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParse(String),

    /// Backend answered 2xx but reported a business failure (`success: false`)
    #[error("{0}")]
    Business(String),
}

impl ApiError {
    /// Whether a read (`GET`) request that failed with this error may be retried.
    ///
    /// Transport failures, timeouts, 429 and 5xx responses are transient;
    /// everything else (4xx, parse failures, business rejections) is not.
    #[must_use]
    pub const fn is_retryable_read(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Request { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Outcome label used for request metrics.
    pub(crate) const fn outcome_label(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::ClientBuild(_) => "config",
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Request { .. } => "http_error",
            Self::ResponseParse(_) => "parse_error",
            Self::Business(_) => "business",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
