use serde::{Deserialize, Serialize};

use super::states::TaskState;

/// The result of one status fetch, as fed to the task state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskObservation {
    /// The server reported a recognized state
    Reported(TaskState),
    /// The fetch itself failed (network, HTTP, decoding)
    FetchFailed(String),
    /// The document arrived but carried no recognizable state
    Malformed(String),
}

impl TaskObservation {
    /// Get a string representation of the observation type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reported(_) => "reported",
            Self::FetchFailed(_) => "fetch_failed",
            Self::Malformed(_) => "malformed",
        }
    }

    /// Extract the error text of a failed or malformed observation
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::FetchFailed(msg) | Self::Malformed(msg) => Some(msg),
            Self::Reported(_) => None,
        }
    }

    /// Reported state, if any
    pub fn reported_state(&self) -> Option<TaskState> {
        match self {
            Self::Reported(state) => Some(*state),
            _ => None,
        }
    }
}
