//! # Task Poller
//!
//! Observes a server-owned task until it reaches `completed` or `failed`.
//!
//! Each call to [`TaskPoller::begin_polling`] spawns one loop that fetches
//! immediately, feeds the result to a [`TaskStateMachine`], and sleeps for
//! the configured interval before the next fetch. Fetches are chained, so
//! two fetches for the same poller are never in flight at once.
//!
//! The loop settles a shared completion future exactly once. Cancelling
//! stops the loop and leaves the future pending forever; dropping the
//! poller cancels it the same way.

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, oneshot, watch, Mutex as AsyncMutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::TaskDocument;
use super::fetcher::TaskStatusFetcher;
use super::outcome::{PollError, PollResult, TaskOutcome};
use crate::config::PollingConfig;
use crate::error::{Result, TaskwatchError};
use crate::events::{EventPublisher, PollerEvent, PublishedEvent};
use crate::logging::{log_error, log_poll_operation};
use crate::state_machine::{PollDecision, TaskObservation, TaskState, TaskStateMachine};

/// Lifecycle of the poller itself, independent of the task's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    /// `begin_polling` has not been called
    Unstarted,
    /// A poll loop is running
    Polling,
    /// The completion future has resolved or rejected
    Settled,
    /// The caller cancelled; the completion future stays pending
    Stopped,
}

/// Cloneable, multi-subscriber completion future
#[derive(Clone)]
pub struct CompletionHandle {
    inner: Shared<BoxFuture<'static, PollResult>>,
}

impl CompletionHandle {
    fn new(receiver: oneshot::Receiver<PollResult>) -> Self {
        let inner = async move {
            match receiver.await {
                Ok(result) => result,
                // Sender dropped without settling: the poll was cancelled
                Err(_) => future::pending::<PollResult>().await,
            }
        }
        .boxed()
        .shared();
        Self { inner }
    }

    /// The settled result, if the future has already completed and been polled
    pub fn peek(&self) -> Option<&PollResult> {
        self.inner.peek()
    }
}

impl Future for CompletionHandle {
    type Output = PollResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("settled", &self.peek().is_some())
            .finish()
    }
}

#[derive(Debug)]
struct PollerShared {
    generation: u64,
    task_id: Option<String>,
    state: TaskState,
    phase: PollerPhase,
    attempts: u32,
    completion: Option<CompletionHandle>,
}

impl PollerShared {
    fn new() -> Self {
        Self {
            generation: 0,
            task_id: None,
            state: TaskState::default(),
            phase: PollerPhase::Unstarted,
            attempts: 0,
            completion: None,
        }
    }
}

/// Polls one remote task at a time until it is terminal
///
/// The cancel sender lives only here, never in the loop, so dropping the
/// poller closes the channel and the loop stops at its next check.
pub struct TaskPoller<F: TaskStatusFetcher> {
    id: Uuid,
    fetcher: Arc<F>,
    config: PollingConfig,
    shared: Arc<Mutex<PollerShared>>,
    cancel_tx: Mutex<Option<watch::Sender<bool>>>,
    fetch_gate: Arc<AsyncMutex<()>>,
    publisher: EventPublisher,
}

impl<F: TaskStatusFetcher> TaskPoller<F> {
    /// Create a poller that fetches through `fetcher`
    pub fn new(fetcher: F, config: PollingConfig) -> Self {
        Self::with_shared_fetcher(Arc::new(fetcher), config)
    }

    /// Create a poller sharing a fetcher with other pollers
    pub fn with_shared_fetcher(fetcher: Arc<F>, config: PollingConfig) -> Self {
        let publisher = EventPublisher::new(config.event_channel_capacity.max(1));
        Self {
            id: Uuid::new_v4(),
            fetcher,
            config,
            shared: Arc::new(Mutex::new(PollerShared::new())),
            cancel_tx: Mutex::new(None),
            fetch_gate: Arc::new(AsyncMutex::new(())),
            publisher,
        }
    }

    /// Start polling `resource_id` and return the completion future
    ///
    /// While a loop is already running this is a no-op that returns the
    /// existing handle. After the previous poll settled or was cancelled,
    /// a fresh loop starts from the `Unknown` state.
    pub fn begin_polling(&self, resource_id: impl Into<String>) -> Result<CompletionHandle> {
        let task_id = resource_id.into();
        if task_id.trim().is_empty() {
            return Err(TaskwatchError::invalid_input(
                "task resource id must not be empty",
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TaskwatchError::Internal(format!("begin_polling requires a Tokio runtime: {e}"))
        })?;

        let mut shared = self.shared.lock();
        if shared.phase == PollerPhase::Polling {
            if let Some(existing) = shared.completion.clone() {
                debug!(
                    poller_id = %self.id,
                    requested_task_id = %task_id,
                    active_task_id = ?shared.task_id,
                    "Poll already in flight; returning existing completion handle"
                );
                return Ok(existing);
            }
        }

        let (completion_tx, completion_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let completion = CompletionHandle::new(completion_rx);

        shared.generation += 1;
        shared.task_id = Some(task_id.clone());
        shared.state = TaskState::Unknown;
        shared.phase = PollerPhase::Polling;
        shared.attempts = 0;
        shared.completion = Some(completion.clone());
        *self.cancel_tx.lock() = Some(cancel_tx);

        let poll_loop = PollLoop {
            poller_id: self.id,
            generation: shared.generation,
            machine: TaskStateMachine::new(task_id.clone()),
            task_id: task_id.clone(),
            fetcher: Arc::clone(&self.fetcher),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            fetch_gate: Arc::clone(&self.fetch_gate),
            publisher: self.publisher.clone(),
            cancel_rx,
            completion_tx: Some(completion_tx),
            started_at: Instant::now(),
            consecutive_failures: 0,
            last_error: None,
            last_document: TaskDocument::default(),
        };
        drop(shared);

        info!(
            poller_id = %self.id,
            task_id = %task_id,
            interval_ms = self.config.interval_ms,
            "🔄 Polling started"
        );
        self.publisher.publish(PollerEvent::Started {
            task_id: task_id.clone(),
        });

        runtime.spawn(poll_loop.run());

        Ok(completion)
    }

    /// Stop polling; returns false if no poll was running
    ///
    /// An in-flight fetch is not aborted, its result is discarded. The
    /// completion future never settles.
    pub fn cancel(&self) -> bool {
        let mut shared = self.shared.lock();
        if shared.phase != PollerPhase::Polling {
            return false;
        }

        shared.phase = PollerPhase::Stopped;
        let task_id = shared.task_id.clone().unwrap_or_default();
        // Taken under the shared lock so a concurrent restart keeps its sender
        let cancel_tx = self.cancel_tx.lock().take();
        drop(shared);

        if let Some(cancel_tx) = cancel_tx {
            let _ = cancel_tx.send(true);
        }

        info!(poller_id = %self.id, task_id = %task_id, "⏹️ Polling cancelled");
        self.publisher.publish(PollerEvent::Cancelled { task_id });
        true
    }

    pub fn is_polling(&self) -> bool {
        self.shared.lock().phase == PollerPhase::Polling
    }

    /// True when a task id is set and the server last reported `new` or `running`
    pub fn is_in_progress(&self) -> bool {
        let shared = self.shared.lock();
        shared.task_id.is_some() && shared.state.is_active()
    }

    pub fn current_state(&self) -> TaskState {
        self.shared.lock().state
    }

    pub fn phase(&self) -> PollerPhase {
        self.shared.lock().phase
    }

    pub fn task_id(&self) -> Option<String> {
        self.shared.lock().task_id.clone()
    }

    /// Fetches issued by the current (or last) poll
    pub fn attempts(&self) -> u32 {
        self.shared.lock().attempts
    }

    /// Completion future of the current (or last) poll
    pub fn completion(&self) -> Option<CompletionHandle> {
        self.shared.lock().completion.clone()
    }

    /// Register an observer for this poller's lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.publisher.subscribe()
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }
}

impl<F: TaskStatusFetcher> Drop for TaskPoller<F> {
    fn drop(&mut self) {
        {
            let mut shared = self.shared.lock();
            if shared.phase == PollerPhase::Polling {
                shared.phase = PollerPhase::Stopped;
                debug!(
                    poller_id = %self.id,
                    task_id = ?shared.task_id,
                    "Poller dropped; stopping poll loop"
                );
            }
        }
        // Dropping the sender wakes the loop with a closed channel
        self.cancel_tx.get_mut().take();
    }
}

impl<F: TaskStatusFetcher> std::fmt::Debug for TaskPoller<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPoller")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("shared", &*self.shared.lock())
            .finish()
    }
}

/// One run of the fetch/evaluate/sleep cycle
struct PollLoop<F: TaskStatusFetcher> {
    poller_id: Uuid,
    generation: u64,
    task_id: String,
    machine: TaskStateMachine,
    fetcher: Arc<F>,
    config: PollingConfig,
    shared: Arc<Mutex<PollerShared>>,
    fetch_gate: Arc<AsyncMutex<()>>,
    publisher: EventPublisher,
    cancel_rx: watch::Receiver<bool>,
    completion_tx: Option<oneshot::Sender<PollResult>>,
    started_at: Instant,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_document: TaskDocument,
}

impl<F: TaskStatusFetcher> PollLoop<F> {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        while self.machine.current_state().should_continue_polling() {
            if self.is_cancelled() {
                return;
            }

            attempt += 1;
            if !self.record_attempt(attempt) {
                return;
            }

            // A cancelled run may still have its last fetch in flight
            let fetched = {
                let _gate = self.fetch_gate.lock().await;
                if self.is_cancelled() {
                    return;
                }
                self.fetcher.fetch_task(&self.task_id).await
            };

            if self.is_cancelled() {
                debug!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempt = attempt,
                    "Discarding fetch result after cancellation"
                );
                return;
            }

            self.observe(attempt, fetched);

            match self.machine.decision() {
                PollDecision::Resolve => {
                    let outcome = TaskOutcome {
                        success: true,
                        task_id: self.task_id.clone(),
                        attempts: attempt,
                        document: std::mem::take(&mut self.last_document),
                    };
                    self.settle(Ok(outcome));
                    return;
                }
                PollDecision::Reject => {
                    let error = PollError::Failed {
                        task_id: self.task_id.clone(),
                        attempts: attempt,
                        document: std::mem::take(&mut self.last_document),
                    };
                    self.settle(Err(error));
                    return;
                }
                PollDecision::Continue => {}
            }

            if let Some(error) = self.ceiling_reached(attempt) {
                self.settle(Err(error));
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {}
                changed = self.cancel_rx.changed() => {
                    if changed.is_err() || *self.cancel_rx.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// True after `cancel()` or once the owning poller was dropped
    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow() || self.cancel_rx.has_changed().is_err()
    }

    /// Update shared attempt count; false if this run is no longer current
    fn record_attempt(&self, attempt: u32) -> bool {
        let mut shared = self.shared.lock();
        if !self.is_current(&shared) {
            return false;
        }
        shared.attempts = attempt;
        true
    }

    fn is_current(&self, shared: &PollerShared) -> bool {
        shared.generation == self.generation && shared.phase == PollerPhase::Polling
    }

    fn observe(&mut self, attempt: u32, fetched: Result<TaskDocument>) {
        let observation = match fetched {
            Ok(document) => match document.parse_state() {
                Ok(state) => {
                    self.consecutive_failures = 0;
                    self.last_document = document;
                    TaskObservation::Reported(state)
                }
                Err(reason) => {
                    self.consecutive_failures = 0;
                    TaskObservation::Malformed(reason)
                }
            },
            Err(error) => {
                self.consecutive_failures += 1;
                if !error.is_recoverable() {
                    log_error(
                        "task_poller",
                        "fetch_task",
                        &error.to_string(),
                        Some(&self.task_id),
                    );
                }
                TaskObservation::FetchFailed(error.to_string())
            }
        };

        match &observation {
            TaskObservation::FetchFailed(error) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempt = attempt,
                    consecutive_failures = self.consecutive_failures,
                    error = %error,
                    "Task status fetch failed; will retry"
                );
                self.last_error = Some(error.clone());
                self.publisher.publish(PollerEvent::FetchFailed {
                    task_id: self.task_id.clone(),
                    attempt,
                    error: error.clone(),
                });
            }
            TaskObservation::Malformed(reason) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempt = attempt,
                    reason = %reason,
                    "Malformed task status document; treating state as unchanged"
                );
                self.publisher.publish(PollerEvent::MalformedDocument {
                    task_id: self.task_id.clone(),
                    attempt,
                    reason: reason.clone(),
                });
            }
            TaskObservation::Reported(_) => {}
        }

        match self.machine.observe(&observation) {
            Ok(Some(transition)) => {
                {
                    let mut shared = self.shared.lock();
                    if self.is_current(&shared) {
                        shared.state = transition.to;
                    }
                }
                log_poll_operation(
                    "state_changed",
                    Some(&self.task_id),
                    &transition.to.to_string(),
                    Some(attempt),
                    Some(&format!("from {}", transition.from)),
                );
                self.publisher.publish(PollerEvent::StateChanged {
                    task_id: self.task_id.clone(),
                    from: transition.from,
                    to: transition.to,
                });
            }
            Ok(None) => {
                debug!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempt = attempt,
                    observation = observation.event_type(),
                    state = %self.machine.current_state(),
                    "No state change"
                );
            }
            Err(error) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempt = attempt,
                    error = %error,
                    "Ignoring server report that violates the task lifecycle"
                );
            }
        }
    }

    fn ceiling_reached(&self, attempt: u32) -> Option<PollError> {
        if let Some(limit) = self.config.max_consecutive_failures {
            if self.consecutive_failures >= limit {
                return Some(PollError::Unreachable {
                    task_id: self.task_id.clone(),
                    consecutive_failures: self.consecutive_failures,
                    last_error: self.last_error.clone().unwrap_or_default(),
                });
            }
        }

        let elapsed = self.started_at.elapsed();
        let attempts_exhausted = self
            .config
            .max_attempts
            .is_some_and(|limit| attempt >= limit);
        let duration_exhausted = self
            .config
            .max_duration()
            .is_some_and(|limit| elapsed >= limit);

        if attempts_exhausted || duration_exhausted {
            return Some(PollError::Timeout {
                task_id: self.task_id.clone(),
                attempts: attempt,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        None
    }

    /// Settle the completion future unless the run was cancelled or replaced
    fn settle(&mut self, result: PollResult) {
        {
            let mut shared = self.shared.lock();
            if !self.is_current(&shared) {
                return;
            }
            shared.phase = PollerPhase::Settled;
        }

        let event = match &result {
            Ok(outcome) => {
                info!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempts = outcome.attempts,
                    "✅ Task completed"
                );
                PollerEvent::Completed {
                    task_id: self.task_id.clone(),
                    attempts: outcome.attempts,
                }
            }
            Err(PollError::Failed { attempts, .. }) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempts = attempts,
                    "❌ Task failed"
                );
                PollerEvent::Failed {
                    task_id: self.task_id.clone(),
                    attempts: *attempts,
                }
            }
            Err(PollError::Timeout {
                attempts,
                elapsed_ms,
                ..
            }) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    attempts = attempts,
                    elapsed_ms = elapsed_ms,
                    "⏰ Polling ceiling reached"
                );
                PollerEvent::TimedOut {
                    task_id: self.task_id.clone(),
                    attempts: *attempts,
                    elapsed_ms: *elapsed_ms,
                }
            }
            Err(PollError::Unreachable {
                consecutive_failures,
                ..
            }) => {
                warn!(
                    poller_id = %self.poller_id,
                    task_id = %self.task_id,
                    consecutive_failures = consecutive_failures,
                    "📡 Task status unreachable"
                );
                PollerEvent::Unreachable {
                    task_id: self.task_id.clone(),
                    consecutive_failures: *consecutive_failures,
                }
            }
        };

        self.publisher.publish(event);
        if let Some(completion_tx) = self.completion_tx.take() {
            let _ = completion_tx.send(result);
        }
    }
}
