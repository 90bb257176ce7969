//! Queue boundary traits

use crate::{PendingHandle, QueueError, TaskDescriptor};
use async_trait::async_trait;

/// Accepts descriptors for deferred execution
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queue name reported in pending handles
    fn name(&self) -> &str;

    /// Accept a task without waiting for it to run
    async fn enqueue(&self, task: TaskDescriptor) -> Result<PendingHandle, QueueError>;
}

/// Executes a dequeued descriptor
///
/// An `Err` is the failure message recorded for the task.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: TaskDescriptor) -> Result<(), String>;
}
