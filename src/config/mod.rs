//! # Taskwatch Configuration System
//!
//! Layered configuration for pollers, the health analyzer and the console
//! API adapter. Every field has a default, so an empty source set yields a
//! working configuration that polls once per second without any ceiling.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskwatch_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let interval = manager.config().polling.interval();
//! let depth = manager.config().health.max_depth;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_TIMEOUT_MS, DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_HEALTH_MAX_DEPTH,
    DEFAULT_HEALTH_PATH, DEFAULT_POLLING_INTERVAL_MS, DEFAULT_TASKS_PATH,
};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TaskwatchConfig {
    /// Task poller behaviour
    pub polling: PollingConfig,

    /// Health tree analysis limits
    pub health: HealthConfig,

    /// Console REST API connection
    pub api: ApiConfig,
}

/// Task poller configuration
///
/// The three ceilings are unset by default, which keeps polling until the
/// task reaches a terminal state or the caller cancels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status fetches in milliseconds
    pub interval_ms: u64,
    /// Maximum number of fetch attempts before timing out
    pub max_attempts: Option<u32>,
    /// Maximum total polling time in milliseconds before timing out
    pub max_duration_ms: Option<u64>,
    /// Consecutive failed fetches after which the task is deemed unreachable
    pub max_consecutive_failures: Option<u32>,
    /// Capacity of the poller event channel
    pub event_channel_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            max_attempts: None,
            max_duration_ms: None,
            max_consecutive_failures: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl PollingConfig {
    /// Build a config with the given interval and no ceilings
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

/// Health analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Deepest tree level walked before failing
    pub max_depth: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HEALTH_MAX_DEPTH,
        }
    }
}

/// Console REST API configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the management endpoint (e.g. "https://localhost:8089")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// Collection path of the task resources
    pub tasks_path: String,
    /// Path of the health details resource
    pub health_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8089".to_string(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
            auth_token: None,
            tasks_path: DEFAULT_TASKS_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

impl TaskwatchConfig {
    /// Validate configuration values that serde cannot check
    pub fn validate(&self) -> ConfigResult<()> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.interval_ms",
                "0",
                "polling interval must be greater than 0",
            ));
        }

        if self.polling.max_attempts == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "polling.max_attempts",
                "0",
                "omit the field to poll without an attempt ceiling",
            ));
        }

        if self.polling.max_duration_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "polling.max_duration_ms",
                "0",
                "omit the field to poll without a time ceiling",
            ));
        }

        if self.polling.max_consecutive_failures == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "polling.max_consecutive_failures",
                "0",
                "omit the field to tolerate any number of failed fetches",
            ));
        }

        if self.polling.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.event_channel_capacity",
                "0",
                "event channel capacity must be greater than 0",
            ));
        }

        if self.health.max_depth == 0 {
            return Err(ConfigurationError::invalid_value(
                "health.max_depth",
                "0",
                "max depth must be greater than 0",
            ));
        }

        if let Err(e) = reqwest::Url::parse(&self.api.base_url) {
            return Err(ConfigurationError::invalid_value(
                "api.base_url",
                self.api.base_url.clone(),
                e.to_string(),
            ));
        }

        Ok(())
    }
}
