//! Task definition and types

use chrono::{DateTime, Utc};
use prism_foundation::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::QueueError;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 hex chars, for log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(TaskId)
            .map_err(|e| QueueError::InvalidTaskId(format!("{}: {}", s, e)))
    }
}

/// A unit of work as it crosses the queue boundary
///
/// Everything here is plain JSON so a descriptor survives serialization;
/// the handler is referenced by its registered name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: TaskId,

    /// Registered handler name
    pub handler: String,

    /// Serialized content payload
    pub content: serde_json::Value,

    /// Caller context, passed through unchanged
    #[serde(default)]
    pub context: Context,

    pub created_at: DateTime<Utc>,
}

impl TaskDescriptor {
    pub fn new(handler: impl Into<String>, content: serde_json::Value, context: Context) -> Self {
        Self {
            id: TaskId::new(),
            handler: handler.into(),
            content,
            context,
            created_at: Utc::now(),
        }
    }

    /// Wire form stored by the queue
    pub fn to_json(&self) -> Result<String, QueueError> {
        serde_json::to_string(self).map_err(|e| QueueError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, QueueError> {
        serde_json::from_str(json).map_err(|e| QueueError::Serialization(e.to_string()))
    }
}

/// Receipt for an enqueued task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHandle {
    pub task_id: TaskId,

    /// Name of the queue holding the task
    pub queue: String,
}

impl PendingHandle {
    pub fn new(task_id: TaskId, queue: impl Into<String>) -> Self {
        Self {
            task_id,
            queue: queue.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_parse() {
        let id = TaskId::new();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_descriptor_json_boundary() {
        let mut context = Context::new();
        context.insert("user".into(), serde_json::json!(42));

        let descriptor = TaskDescriptor::new(
            "summarize",
            serde_json::json!({"type": "text", "text": "hello"}),
            context,
        );

        let json = descriptor.to_json().unwrap();
        let restored = TaskDescriptor::from_json(&json).unwrap();
        assert_eq!(restored, descriptor);
        assert_eq!(restored.context["user"], 42);
    }
}
