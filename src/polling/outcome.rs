use serde::Serialize;
use thiserror::Error;

use super::document::TaskDocument;

/// Settled value of a completion future
pub type PollResult = Result<TaskOutcome, PollError>;

/// Successful completion of a polled task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    /// Always `true`; kept for callers that branch on it
    pub success: bool,
    pub task_id: String,
    /// Number of fetches issued, successful or not
    pub attempts: u32,
    /// The document that reported `completed`
    pub document: TaskDocument,
}

/// Ways a poll can end without the task completing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    /// The server reported the task as failed
    #[error("Task {task_id} failed after {attempts} polls")]
    Failed {
        task_id: String,
        attempts: u32,
        document: TaskDocument,
    },

    /// An attempt or duration ceiling was reached before a terminal state
    #[error("Polling task {task_id} timed out after {attempts} attempts ({elapsed_ms}ms)")]
    Timeout {
        task_id: String,
        attempts: u32,
        elapsed_ms: u64,
    },

    /// Too many consecutive fetches failed
    #[error("Task {task_id} unreachable after {consecutive_failures} failed fetches: {last_error}")]
    Unreachable {
        task_id: String,
        consecutive_failures: u32,
        last_error: String,
    },
}

impl PollError {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Failed { task_id, .. }
            | Self::Timeout { task_id, .. }
            | Self::Unreachable { task_id, .. } => task_id,
        }
    }

    /// True only when the server itself reported failure
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
