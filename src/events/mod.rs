pub mod publisher;

pub use publisher::{EventPublisher, PollerEvent, PublishedEvent};
