//! # Task Polling
//!
//! Tracks long-running server tasks (deploys, asset cache builds, field
//! summaries) by fetching their status resource until it is terminal.
//!
//! ```rust,no_run
//! use taskwatch_core::client::ConsoleApiClient;
//! use taskwatch_core::config::TaskwatchConfig;
//! use taskwatch_core::polling::TaskPoller;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TaskwatchConfig::default();
//! let client = ConsoleApiClient::new(config.api.clone())?;
//! let poller = TaskPoller::new(client, config.polling.clone());
//!
//! match poller.begin_polling("deploy-42")?.await {
//!     Ok(outcome) => println!("done after {} polls", outcome.attempts),
//!     Err(e) => eprintln!("deploy did not finish: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod fetcher;
pub mod outcome;
pub mod poller;

pub use document::TaskDocument;
pub use fetcher::TaskStatusFetcher;
pub use outcome::{PollError, PollResult, TaskOutcome};
pub use poller::{CompletionHandle, PollerPhase, TaskPoller};
