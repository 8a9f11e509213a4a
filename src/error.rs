//! # Error Types
//!
//! Crate-level error handling shared by the poller, the analyzer, the HTTP
//! adapter and configuration loading.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::health::HealthError;

/// Crate result type
pub type Result<T> = std::result::Result<T, TaskwatchError>;

/// Errors surfaced by taskwatch operations
#[derive(Debug, Error)]
pub enum TaskwatchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Health document error: {0}")]
    Health(#[from] HealthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaskwatchError {
    /// Create an API error from an HTTP status and body
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Check if the error is transient (worth another poll)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            TaskwatchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TaskwatchError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
