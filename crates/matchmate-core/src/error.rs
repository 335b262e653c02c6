//! Error types for the MatchMate library.
//!
//! The fetcher surfaces a transport/parse-level taxonomy so callers can
//! distinguish "server unreachable" from "server returned an unexpected
//! shape". The sync engine never propagates a panic for any of these:
//! every failure during a refresh is recorded and followed by a local
//! fallback.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the MatchMate library.
#[derive(Debug, Error)]
pub enum MatchError {
    // Network errors
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Server returned a non-HTTP response")]
    InvalidResponse,

    #[error("Server error with status code {code}")]
    StatusCode { code: u16 },

    #[error("No data received from server")]
    NoData,

    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    // Decoding errors
    #[error("Failed to decode response: {message}")]
    Decoding {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Generic errors
    #[error("An unknown error occurred: {0}")]
    Other(String),
}

/// Result type alias for MatchMate operations.
pub type Result<T> = std::result::Result<T, MatchError>;

// Conversion implementations for common error types

impl From<std::io::Error> for MatchError {
    fn from(err: std::io::Error) -> Self {
        MatchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        MatchError::Decoding {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for MatchError {
    fn from(err: rusqlite::Error) -> Self {
        MatchError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for MatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MatchError::Timeout(Duration::from_secs(0))
        } else {
            MatchError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl MatchError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MatchError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Transport failures (DNS, connection refused, timeout) and non-2xx
    /// statuses are retryable. `NoData` and decode failures are not: the
    /// server answered, it just answered with something unusable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MatchError::Network { .. }
                | MatchError::Timeout(_)
                | MatchError::InvalidResponse
                | MatchError::StatusCode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MatchError::StatusCode { code: 503 };
        assert_eq!(err.to_string(), "Server error with status code 503");

        let err = MatchError::NoData;
        assert_eq!(err.to_string(), "No data received from server");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(MatchError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(MatchError::StatusCode { code: 500 }.is_retryable());
        assert!(MatchError::Network {
            message: "connection refused".into(),
            cause: None
        }
        .is_retryable());

        assert!(!MatchError::NoData.is_retryable());
        assert!(!MatchError::Decoding {
            message: "bad shape".into(),
            source: None
        }
        .is_retryable());
        assert!(!MatchError::Database {
            message: "locked".into(),
            source: None
        }
        .is_retryable());
    }

    #[test]
    fn test_json_error_maps_to_decoding() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let mapped: MatchError = err.into();
        assert!(matches!(mapped, MatchError::Decoding { .. }));
    }
}
