//! # Console Client
//!
//! REST adapter implementing [`crate::polling::TaskStatusFetcher`] and
//! fetching health details documents.

pub mod console_client;

pub use console_client::ConsoleApiClient;
