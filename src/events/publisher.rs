use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::events;
use crate::state_machine::TaskState;

/// Lifecycle notifications emitted by a task poller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollerEvent {
    Started {
        task_id: String,
    },
    StateChanged {
        task_id: String,
        from: TaskState,
        to: TaskState,
    },
    FetchFailed {
        task_id: String,
        attempt: u32,
        error: String,
    },
    MalformedDocument {
        task_id: String,
        attempt: u32,
        reason: String,
    },
    Completed {
        task_id: String,
        attempts: u32,
    },
    Failed {
        task_id: String,
        attempts: u32,
    },
    TimedOut {
        task_id: String,
        attempts: u32,
        elapsed_ms: u64,
    },
    Unreachable {
        task_id: String,
        consecutive_failures: u32,
    },
    Cancelled {
        task_id: String,
    },
}

impl PollerEvent {
    /// Dotted event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => events::POLLING_STARTED,
            Self::StateChanged { .. } => events::STATE_CHANGED,
            Self::FetchFailed { .. } => events::FETCH_FAILED,
            Self::MalformedDocument { .. } => events::MALFORMED_DOCUMENT,
            Self::Completed { .. } => events::TASK_COMPLETED,
            Self::Failed { .. } => events::TASK_FAILED,
            Self::TimedOut { .. } => events::POLLING_TIMED_OUT,
            Self::Unreachable { .. } => events::TASK_UNREACHABLE,
            Self::Cancelled { .. } => events::POLLING_CANCELLED,
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Self::Started { task_id }
            | Self::StateChanged { task_id, .. }
            | Self::FetchFailed { task_id, .. }
            | Self::MalformedDocument { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. }
            | Self::TimedOut { task_id, .. }
            | Self::Unreachable { task_id, .. }
            | Self::Cancelled { task_id } => task_id,
        }
    }

    /// Whether this event settles (or abandons) the poll
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. }
                | Self::Failed { .. }
                | Self::TimedOut { .. }
                | Self::Unreachable { .. }
                | Self::Cancelled { .. }
        )
    }
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub event: PollerEvent,
    pub published_at: DateTime<Utc>,
}

/// Per-poller broadcast of lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber
    pub fn publish(&self, event: PollerEvent) {
        let published = PublishedEvent {
            event,
            published_at: Utc::now(),
        };

        // No subscribers is fine; events are advisory
        let _ = self.sender.send(published);
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        publisher.publish(PollerEvent::Started {
            task_id: "t-1".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.name(), "task.polling_started");
        assert_eq!(received.event.task_id(), "t-1");
        assert!(!received.event.is_final());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = EventPublisher::default();
        publisher.publish(PollerEvent::Cancelled {
            task_id: "t-2".to_string(),
        });
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = PollerEvent::StateChanged {
            task_id: "t-3".to_string(),
            from: TaskState::New,
            to: TaskState::Running,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["to"], "running");
    }
}
