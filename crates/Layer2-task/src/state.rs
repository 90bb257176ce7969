//! Task state machine
//!
//! `Pending → Queued → Running → {Completed | Failed}`; queued work may
//! become `Cancelled` when the queue shuts down.

use serde::{Deserialize, Serialize};

/// Possible states of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Task is created but not yet accepted
    Pending,

    /// Task is queued for execution
    Queued,

    /// Task is currently running
    Running,

    /// Task completed successfully
    Completed,

    /// Task failed with an error
    Failed(String),

    /// Task was cancelled before it started
    Cancelled,
}

impl TaskState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed(_) | TaskState::Cancelled
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }

    /// Check if task is pending (not yet started)
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Queued)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskState::Completed)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TaskState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskState::Pending => "Pending",
            TaskState::Queued => "Queued",
            TaskState::Running => "Running",
            TaskState::Completed => "Completed",
            TaskState::Failed(_) => "Failed",
            TaskState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed("boom".into()).is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }

    #[test]
    fn test_error_accessor() {
        assert_eq!(TaskState::Failed("boom".into()).error(), Some("boom"));
        assert_eq!(TaskState::Completed.error(), None);
        assert_eq!(TaskState::Queued.to_string(), "Queued");
    }
}
