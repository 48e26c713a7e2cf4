//! Error types
//!
//! `SearchError` is the only error surfaced by the search facade. Backend
//! failures are described by `BackendError` and are swallowed by the
//! dispatcher unless no backend produced anything.

use thiserror::Error;

/// Errors observed by callers of the search facade
#[derive(Debug, Error)]
pub enum SearchError {
    /// Generic search failure, optionally wrapping the last backend error
    #[error("{message}")]
    Search {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    /// A provider refused the request because of rate limiting
    #[error("ratelimit: {0}")]
    Ratelimit(String),

    /// The search ran out of time before any backend answered
    #[error("timed out: {0}")]
    Timeout(String),
}

impl SearchError {
    /// Create a generic search error without a cause
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
            source: None,
        }
    }

    /// Build the error reported when no backend produced a result
    pub fn from_last_error(err: Option<BackendError>) -> Self {
        match err {
            Some(e) if e.is_timeout() => Self::Timeout(e.to_string()),
            Some(BackendError::Ratelimit(msg)) => Self::Ratelimit(msg),
            Some(e) => Self::Search {
                message: e.to_string(),
                source: Some(e),
            },
            None => Self::msg("No results found."),
        }
    }
}

/// Errors raised by an individual backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("ratelimit: {0}")]
    Ratelimit(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("failed to build backend: {0}")]
    Build(String),

    #[error("search cancelled")]
    Cancelled,
}

impl BackendError {
    /// Whether this error describes a deadline or timeout condition
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) if e.is_timeout() => true,
            other => other.to_string().contains("timed out"),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Convenience alias for facade results
pub type Result<T> = std::result::Result<T, SearchError>;
