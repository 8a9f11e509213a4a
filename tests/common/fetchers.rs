//! Scripted task status fetchers for poller integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskwatch_core::{Result, TaskDocument, TaskStatusFetcher, TaskwatchError};

/// One scripted response
#[derive(Debug, Clone)]
pub enum Step {
    State(&'static str),
    Document(TaskDocument),
    Unavailable(&'static str),
}

impl Step {
    fn respond(&self) -> Result<TaskDocument> {
        match self {
            Step::State(state) => Ok(TaskDocument::with_state(*state)),
            Step::Document(document) => Ok(document.clone()),
            Step::Unavailable(message) => Err(TaskwatchError::api_error(503, *message)),
        }
    }
}

/// Replays a fixed sequence of responses, repeating the last one forever
#[derive(Debug, Clone)]
pub struct ScriptedFetcher {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Option<Step>>>,
    fetches: Arc<AtomicUsize>,
    requested_ids: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(None)),
            fetches: Arc::new(AtomicUsize::new(0)),
            requested_ids: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn states(states: &[&'static str]) -> Self {
        Self::new(states.iter().copied().map(Step::State).collect())
    }

    /// Hold every response for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.requested_ids.lock().clone()
    }

    /// Highest number of fetches observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStatusFetcher for ScriptedFetcher {
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDocument> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requested_ids.lock().push(task_id.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let step = {
            let mut steps = self.steps.lock();
            let mut last = self.last.lock();
            if let Some(next) = steps.pop_front() {
                *last = Some(next);
            }
            last.clone()
        };

        match step {
            Some(step) => step.respond(),
            None => Err(TaskwatchError::api_error(404, "no scripted response")),
        }
    }
}
