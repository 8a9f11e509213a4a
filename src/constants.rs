//! # System Constants
//!
//! Defaults and event names shared by the poller, the analyzer and the
//! configuration layer.

/// Delay between successive task status fetches
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 1000;

/// Capacity of each poller's event broadcast channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Deepest health tree level the analyzer will walk
pub const DEFAULT_HEALTH_MAX_DEPTH: usize = 64;

/// Default request timeout for the console API
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30000;

/// REST collection holding console tasks
pub const DEFAULT_TASKS_PATH: &str = "/services/dmc/tasks";

/// REST resource holding the health details tree
pub const DEFAULT_HEALTH_PATH: &str = "/services/server/health/splunkd/details";

/// Separator used when rendering an anomaly path as a single label
pub const ANOMALY_PATH_SEPARATOR: &str = " | ";

/// Names of the events published by task pollers
pub mod events {
    pub const POLLING_STARTED: &str = "task.polling_started";
    pub const STATE_CHANGED: &str = "task.state_changed";
    pub const FETCH_FAILED: &str = "task.fetch_failed";
    pub const MALFORMED_DOCUMENT: &str = "task.malformed_document";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_FAILED: &str = "task.failed";
    pub const POLLING_TIMED_OUT: &str = "task.polling_timed_out";
    pub const TASK_UNREACHABLE: &str = "task.unreachable";
    pub const POLLING_CANCELLED: &str = "task.polling_cancelled";
}
