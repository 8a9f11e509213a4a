use serde::{Deserialize, Serialize};
use std::fmt;

/// Task state as tracked by a poller
///
/// `Unknown` never appears on the wire. It is the state before the first
/// successful observation, and polling always continues from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No status has been observed yet
    #[default]
    Unknown,
    /// Task was accepted by the server but has not started
    New,
    /// Task is currently being executed by the server
    Running,
    /// Task completed successfully
    Completed,
    /// Task failed
    Failed,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the server has reported the task as pending or running
    pub fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::Running)
    }

    /// Continuation predicate evaluated before every fetch
    pub fn should_continue_polling(&self) -> bool {
        !self.is_terminal()
    }

    /// Parse a state reported by the server; `unknown` is not a wire value
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Human-readable label for status displays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::New => "New",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// Position in the lifecycle; a report may never move a task backwards
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::New => 1,
            Self::Running => 2,
            Self::Completed | Self::Failed => 3,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::New => write!(f, "new"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| format!("Invalid task state: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_terminal_check() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Unknown.is_terminal());
        assert!(!TaskState::New.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn test_continuation_predicate() {
        assert!(TaskState::Unknown.should_continue_polling());
        assert!(TaskState::New.should_continue_polling());
        assert!(TaskState::Running.should_continue_polling());
        assert!(!TaskState::Completed.should_continue_polling());
        assert!(!TaskState::Failed.should_continue_polling());
    }

    #[test]
    fn test_unknown_is_not_active() {
        assert!(!TaskState::Unknown.is_active());
        assert!(TaskState::New.is_active());
        assert!(TaskState::Running.is_active());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(TaskState::Running.to_string(), "running");
        assert_eq!("completed".parse::<TaskState>().unwrap(), TaskState::Completed);
        assert!("unknown".parse::<TaskState>().is_err());
        assert!("done".parse::<TaskState>().is_err());
        assert_eq!(TaskState::Failed.label(), "Failed");
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&TaskState::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
