//! # prism-queue
//!
//! Task queue boundary for Prism.
//! Asynchronous transformations cross this boundary as serialized
//! [`TaskDescriptor`]s and run through a [`TaskRunner`].
//!
//! ## Features
//!
//! - `TaskQueue` / `TaskRunner` traits
//! - Task ids, states and pending handles
//! - `LocalQueue`: in-process queue with bounded concurrency,
//!   a state table and lifecycle events

pub mod error;
pub mod local;
pub mod queue;
pub mod state;
pub mod task;

pub use error::QueueError;
pub use local::{LocalQueue, LocalQueueConfig, QueueStats};
pub use queue::{TaskQueue, TaskRunner};
pub use state::TaskState;
pub use task::{PendingHandle, TaskDescriptor, TaskId};
