// src/error.rs

//! Unified error handling for the standings crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request failed for good: non-success status or retry budget spent
    #[error("Network error{}: {message}", status_suffix(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Request timed out (retryable)
    #[error("Timeout: {0}")]
    Timeout(String),

    /// No table in the document looks like a standings table
    #[error("No standings table found: {0}")]
    MissingTable(String),

    /// A single table row could not be parsed
    #[error("Row {row} parse error: {message}")]
    RowParse { row: usize, message: String },

    /// A record was about to be built without a name
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Change events could not be delivered
    #[error("Notification error: {0}")]
    Notify(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl AppError {
    /// Create a network error, optionally carrying the response status.
    pub fn network(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Network {
            status,
            message: message.to_string(),
        }
    }

    /// Create a row-scoped parse error.
    pub fn row_parse(row: usize, message: impl fmt::Display) -> Self {
        Self::RowParse {
            row,
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the failed operation may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display_with_status() {
        let err = AppError::network(Some(503), "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Network error (status 503): Service Unavailable"
        );
    }

    #[test]
    fn test_network_display_without_status() {
        let err = AppError::network(None, "gave up");
        assert_eq!(err.to_string(), "Network error: gave up");
    }

    #[test]
    fn test_only_timeouts_are_retryable() {
        assert!(AppError::Timeout("slow".into()).is_retryable());
        assert!(!AppError::network(Some(500), "boom").is_retryable());
        assert!(!AppError::MissingTable("x".into()).is_retryable());
    }
}
