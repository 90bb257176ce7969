//! Queue error types

use crate::TaskId;
use prism_foundation::Error as FoundationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("Queue '{0}' is shut down")]
    ShutDown(String),

    #[error("Task serialization failed: {0}")]
    Serialization(String),

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    #[error("Timed out waiting for task {0}")]
    WaitTimeout(TaskId),

    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),
}

impl From<QueueError> for FoundationError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::WaitTimeout(id) => FoundationError::Timeout(format!("task {}", id)),
            other => FoundationError::Queue(other.to_string()),
        }
    }
}
