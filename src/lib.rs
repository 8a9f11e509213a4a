#![allow(clippy::doc_markdown)] // Allow technical terms like splunkd, JSON in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Taskwatch Core
//!
//! Client-side tracking of long-running server tasks and analysis of the
//! nested health-status tree reported by a server console.
//!
//! ## Overview
//!
//! Two independent components share one configuration, logging and error
//! stack:
//!
//! - A **task poller** that repeatedly fetches a task's status resource,
//!   drives a small state machine, and settles a shared completion future
//!   once the task is completed or failed.
//! - A **health tree analyzer** that flattens the health tree into a name
//!   index and finds the paths leading to unhealthy leaves.
//!
//! ## Module Organization
//!
//! - [`polling`] - Task poller, fetcher seam and poll outcomes
//! - [`state_machine`] - Task states, guards and transitions
//! - [`events`] - Poller lifecycle events over a broadcast channel
//! - [`health`] - Health tree model and analyzer
//! - [`client`] - Console REST API adapter
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskwatch_core::{ConsoleApiClient, HealthTreeAnalyzer, TaskPoller, TaskwatchConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! taskwatch_core::logging::init_structured_logging();
//! let config = TaskwatchConfig::default();
//! let client = ConsoleApiClient::new(config.api.clone())?.with_health_config(&config.health);
//!
//! let tree = client.fetch_health_details().await?;
//! let report = HealthTreeAnalyzer::new(&config.health).analyze(&tree)?;
//! for anomaly in &report.anomalies {
//!     println!("{} is {}", anomaly.display_label(), anomaly.health);
//! }
//!
//! let poller = TaskPoller::new(client, config.polling.clone());
//! let outcome = poller.begin_polling("bundle-push-7")?.await?;
//! println!("task finished after {} polls", outcome.attempts);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod health;
pub mod logging;
pub mod polling;
pub mod state_machine;

pub use client::ConsoleApiClient;
pub use config::{ApiConfig, ConfigManager, HealthConfig, PollingConfig, TaskwatchConfig};
pub use error::{Result, TaskwatchError};
pub use events::{EventPublisher, PollerEvent};
pub use health::{AnomalyPath, HealthFeature, HealthReport, HealthStatus, HealthTreeAnalyzer};
pub use polling::{
    CompletionHandle, PollError, PollResult, TaskDocument, TaskOutcome, TaskPoller,
    TaskStatusFetcher,
};
pub use state_machine::TaskState;
