use serde::Serialize;

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::TaskObservation,
    guards::{NoRegressionGuard, StateGuard, TerminalStateGuard},
    states::TaskState,
};

/// A state change accepted by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: TaskState,
    pub to: TaskState,
}

/// What the poll loop should do after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Schedule another fetch
    Continue,
    /// The task completed; resolve the completion future
    Resolve,
    /// The task failed; reject the completion future
    Reject,
}

/// Client-side view of a remote task's lifecycle
///
/// The machine is fed observations in fetch order. Only reported states move
/// it; failed fetches and malformed documents leave it where it was.
#[derive(Debug, Clone)]
pub struct TaskStateMachine {
    task_id: String,
    current: TaskState,
    transitions: Vec<Transition>,
}

impl TaskStateMachine {
    /// Create a machine in the `Unknown` state
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            current: TaskState::default(),
            transitions: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn current_state(&self) -> TaskState {
        self.current
    }

    /// Accepted transitions, oldest first
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Apply an observation, returning the transition it caused, if any
    pub fn observe(
        &mut self,
        observation: &TaskObservation,
    ) -> StateMachineResult<Option<Transition>> {
        let Some(reported) = observation.reported_state() else {
            return Ok(None);
        };

        let target = self.determine_target_state(self.current, reported)?;
        self.check_guards(self.current, target)?;

        if target == self.current {
            return Ok(None);
        }

        let transition = Transition {
            from: self.current,
            to: target,
        };
        self.current = target;
        self.transitions.push(transition);
        Ok(Some(transition))
    }

    /// Decision implied by the current state
    pub fn decision(&self) -> PollDecision {
        match self.current {
            TaskState::Completed => PollDecision::Resolve,
            TaskState::Failed => PollDecision::Reject,
            TaskState::Unknown | TaskState::New | TaskState::Running => PollDecision::Continue,
        }
    }

    /// Determine the target state for a server report
    fn determine_target_state(
        &self,
        current_state: TaskState,
        reported: TaskState,
    ) -> StateMachineResult<TaskState> {
        // Terminal finality and ordering are left to the guards
        let target = match (current_state, reported) {
            (_, TaskState::Unknown) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(current_state.to_string()),
                    to: reported.to_string(),
                })
            }

            (_, state) => state,
        };

        Ok(target)
    }

    fn check_guards(&self, from: TaskState, to: TaskState) -> StateMachineResult<()> {
        let guards: [&dyn StateGuard; 2] = [&TerminalStateGuard, &NoRegressionGuard];
        for guard in guards {
            guard.check(from, to)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::errors::GuardError;

    fn reported(state: TaskState) -> TaskObservation {
        TaskObservation::Reported(state)
    }

    #[test]
    fn test_starts_unknown_and_continues() {
        let sm = TaskStateMachine::new("deploy-1");
        assert_eq!(sm.current_state(), TaskState::Unknown);
        assert_eq!(sm.decision(), PollDecision::Continue);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut sm = TaskStateMachine::new("deploy-1");

        let t = sm.observe(&reported(TaskState::New)).unwrap();
        assert_eq!(
            t,
            Some(Transition {
                from: TaskState::Unknown,
                to: TaskState::New
            })
        );
        assert!(sm.observe(&reported(TaskState::Running)).unwrap().is_some());
        assert!(sm.observe(&reported(TaskState::Running)).unwrap().is_none());
        assert!(sm.observe(&reported(TaskState::Completed)).unwrap().is_some());

        assert_eq!(sm.decision(), PollDecision::Resolve);
        assert_eq!(sm.transitions().len(), 3);
    }

    #[test]
    fn test_failure_from_new() {
        let mut sm = TaskStateMachine::new("cache-7");
        sm.observe(&reported(TaskState::New)).unwrap();
        sm.observe(&reported(TaskState::Failed)).unwrap();
        assert_eq!(sm.decision(), PollDecision::Reject);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut sm = TaskStateMachine::new("cache-7");
        sm.observe(&reported(TaskState::Completed)).unwrap();

        let err = sm.observe(&reported(TaskState::Running)).unwrap_err();
        assert_eq!(
            err,
            StateMachineError::GuardFailed(GuardError::AlreadyTerminal {
                state: "completed".to_string()
            })
        );
        assert_eq!(sm.current_state(), TaskState::Completed);

        // A repeated terminal report is refused by the same guard
        let repeat = sm.observe(&reported(TaskState::Completed)).unwrap_err();
        assert!(matches!(
            repeat,
            StateMachineError::GuardFailed(GuardError::AlreadyTerminal { .. })
        ));
        assert_eq!(sm.transitions().len(), 1);
    }

    #[test]
    fn test_regression_is_rejected() {
        let mut sm = TaskStateMachine::new("deploy-2");
        sm.observe(&reported(TaskState::Running)).unwrap();

        let err = sm.observe(&reported(TaskState::New)).unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed(_)));
        assert_eq!(sm.current_state(), TaskState::Running);
    }

    #[test]
    fn test_failed_fetch_leaves_state_untouched() {
        let mut sm = TaskStateMachine::new("deploy-3");
        sm.observe(&reported(TaskState::New)).unwrap();

        let outcome = sm
            .observe(&TaskObservation::FetchFailed("connection reset".into()))
            .unwrap();
        assert!(outcome.is_none());
        let outcome = sm
            .observe(&TaskObservation::Malformed("missing state".into()))
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(sm.current_state(), TaskState::New);
    }
}
