// Task state machine
//
// Client-side lifecycle of a remote task: an initial Unknown state, the four
// server-reported states, and the guards that keep terminal states final.

pub mod errors;
pub mod events;
pub mod guards;
pub mod states;
pub mod task_state_machine;

pub use errors::{GuardError, StateMachineError, StateMachineResult};
pub use events::TaskObservation;
pub use guards::{NoRegressionGuard, StateGuard, TerminalStateGuard};
pub use states::TaskState;
pub use task_state_machine::{PollDecision, TaskStateMachine, Transition};
