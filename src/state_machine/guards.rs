use super::errors::{GuardError, GuardResult};
use super::states::TaskState;

/// Trait for implementing state transition guards
pub trait StateGuard: Send + Sync {
    /// Check if a transition is allowed
    fn check(&self, from: TaskState, to: TaskState) -> GuardResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard rejecting any report once the task is terminal
pub struct TerminalStateGuard;

impl StateGuard for TerminalStateGuard {
    fn check(&self, from: TaskState, _to: TaskState) -> GuardResult<()> {
        if from.is_terminal() {
            return Err(GuardError::AlreadyTerminal {
                state: from.to_string(),
            });
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Terminal states admit no further transitions"
    }
}

/// Guard rejecting reports that move a task backwards (e.g. running -> new)
pub struct NoRegressionGuard;

impl StateGuard for NoRegressionGuard {
    fn check(&self, from: TaskState, to: TaskState) -> GuardResult<()> {
        if to.rank() < from.rank() {
            return Err(GuardError::Regression {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Reported states must not regress"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_guard() {
        assert!(TerminalStateGuard
            .check(TaskState::Running, TaskState::Completed)
            .is_ok());
        assert!(matches!(
            TerminalStateGuard.check(TaskState::Completed, TaskState::Running),
            Err(GuardError::AlreadyTerminal { .. })
        ));
    }

    #[test]
    fn test_regression_guard() {
        assert!(NoRegressionGuard.check(TaskState::New, TaskState::New).is_ok());
        assert!(NoRegressionGuard
            .check(TaskState::Unknown, TaskState::Failed)
            .is_ok());
        assert!(matches!(
            NoRegressionGuard.check(TaskState::Running, TaskState::New),
            Err(GuardError::Regression { .. })
        ));
    }
}
