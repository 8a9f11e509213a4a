use async_trait::async_trait;
use std::sync::Arc;

use super::document::TaskDocument;
use crate::error::Result;

/// Read-only access to a remote task resource
///
/// Implementations perform one idempotent GET per call. Errors are treated
/// by the poller as transient.
#[async_trait]
pub trait TaskStatusFetcher: Send + Sync + 'static {
    /// Fetch the current representation of the task with the given id
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDocument>;
}

#[async_trait]
impl<T> TaskStatusFetcher for Arc<T>
where
    T: TaskStatusFetcher + ?Sized,
{
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDocument> {
        (**self).fetch_task(task_id).await
    }
}
