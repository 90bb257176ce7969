//! Local Queue - in-process task queue on the tokio runtime
//!
//! Features:
//! - Bounded worker concurrency (semaphore)
//! - JSON serialization boundary at enqueue
//! - State table with `state`, `wait`, `stats`; finished tasks are kept
//!   up to `retain_finished`, oldest dropped first
//! - task.enqueued / task.completed / task.failed events

use crate::queue::{TaskQueue, TaskRunner};
use crate::state::TaskState;
use crate::task::{PendingHandle, TaskDescriptor, TaskId};
use crate::QueueError;
use async_trait::async_trait;
use prism_foundation::event::task as task_events;
use prism_foundation::{EventBus, PrismEvent};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock, Semaphore};
use tracing::{debug, error, info};

/// Configuration for the local queue
#[derive(Debug, Clone)]
pub struct LocalQueueConfig {
    /// Name reported in pending handles
    pub name: String,

    /// Maximum concurrently running tasks
    pub max_concurrent: usize,

    /// Finished tasks whose state stays queryable; older ones are forgotten
    pub retain_finished: usize,
}

impl Default for LocalQueueConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            max_concurrent: 4,
            retain_finished: 1024,
        }
    }
}

impl LocalQueueConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_retain_finished(mut self, retain_finished: usize) -> Self {
        self.retain_finished = retain_finished;
        self
    }
}

/// Snapshot of task counts by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl QueueStats {
    pub fn total(&self) -> usize {
        self.queued + self.running + self.completed + self.failed + self.cancelled
    }

    pub fn active(&self) -> usize {
        self.queued + self.running
    }
}

struct TaskRecord {
    handler: String,
    state: watch::Sender<TaskState>,
}

struct Inner {
    config: LocalQueueConfig,
    runner: Arc<dyn TaskRunner>,
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    /// Terminal tasks, oldest first
    finished: Mutex<VecDeque<TaskId>>,
    permits: Arc<Semaphore>,
    accepting: AtomicBool,
}

/// In-process task queue
#[derive(Clone)]
pub struct LocalQueue {
    inner: Arc<Inner>,
    events: Option<Arc<EventBus>>,
}

impl LocalQueue {
    /// Create with default configuration
    pub fn new(runner: Arc<dyn TaskRunner>) -> Self {
        Self::with_config(LocalQueueConfig::default(), runner)
    }

    pub fn with_config(config: LocalQueueConfig, runner: Arc<dyn TaskRunner>) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner: Arc::new(Inner {
                config,
                runner,
                tasks: RwLock::new(HashMap::new()),
                finished: Mutex::new(VecDeque::new()),
                permits,
                accepting: AtomicBool::new(true),
            }),
            events: None,
        }
    }

    /// Publish lifecycle events on this bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &LocalQueueConfig {
        &self.inner.config
    }

    /// Current state of a task; `None` once forgotten past retention
    pub async fn state(&self, task_id: TaskId) -> Option<TaskState> {
        let tasks = self.inner.tasks.read().await;
        tasks.get(&task_id).map(|r| r.state.borrow().clone())
    }

    /// Wait until a task reaches a terminal state
    pub async fn wait(&self, task_id: TaskId, timeout: Duration) -> Result<TaskState, QueueError> {
        let mut rx = {
            let tasks = self.inner.tasks.read().await;
            tasks
                .get(&task_id)
                .ok_or(QueueError::UnknownTask(task_id))?
                .state
                .subscribe()
        };

        let result = tokio::time::timeout(timeout, rx.wait_for(TaskState::is_terminal)).await;
        match result {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(QueueError::UnknownTask(task_id)),
            Err(_) => Err(QueueError::WaitTimeout(task_id)),
        }
    }

    /// Task counts by state
    pub async fn stats(&self) -> QueueStats {
        let tasks = self.inner.tasks.read().await;
        let mut stats = QueueStats::default();

        for record in tasks.values() {
            match &*record.state.borrow() {
                TaskState::Pending | TaskState::Queued => stats.queued += 1,
                TaskState::Running => stats.running += 1,
                TaskState::Completed => stats.completed += 1,
                TaskState::Failed(_) => stats.failed += 1,
                TaskState::Cancelled => stats.cancelled += 1,
            }
        }

        stats
    }

    /// Cancel a task that has not started yet
    ///
    /// Returns `false` when the task is already running or finished.
    pub async fn cancel(&self, task_id: TaskId) -> Result<bool, QueueError> {
        let cancelled = {
            let tasks = self.inner.tasks.read().await;
            let record = tasks.get(&task_id).ok_or(QueueError::UnknownTask(task_id))?;

            let cancelled = record.state.send_if_modified(cancel_if_pending);
            if cancelled {
                info!(task_id = %task_id, handler = %record.handler, "Cancelled queued task");
            }
            cancelled
        };

        if cancelled {
            self.retire(task_id).await;
        }
        Ok(cancelled)
    }

    /// Stop accepting work; tasks that have not started are cancelled
    pub async fn shutdown(&self) {
        if !self.inner.accepting.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.permits.close();

        let cancelled: Vec<TaskId> = {
            let tasks = self.inner.tasks.read().await;
            tasks
                .iter()
                .filter(|(_, record)| record.state.send_if_modified(cancel_if_pending))
                .map(|(task_id, _)| *task_id)
                .collect()
        };
        for task_id in cancelled {
            self.retire(task_id).await;
        }

        info!(queue = %self.inner.config.name, "Queue shut down");
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    async fn publish(&self, event: PrismEvent) {
        if let Some(events) = &self.events {
            events.publish(event).await;
        }
    }

    /// Move the task to a new state if it is still in `from`
    async fn transition(&self, task_id: TaskId, from: &TaskState, to: TaskState) -> bool {
        let tasks = self.inner.tasks.read().await;
        let Some(record) = tasks.get(&task_id) else {
            return false;
        };
        record.state.send_if_modified(|state| {
            if state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Record a terminal task and forget the oldest ones past retention
    ///
    /// A waiter subscribed before removal still sees the terminal state.
    async fn retire(&self, task_id: TaskId) {
        let evicted: Vec<TaskId> = {
            let mut finished = self.inner.finished.lock();
            finished.push_back(task_id);
            let excess = finished
                .len()
                .saturating_sub(self.inner.config.retain_finished);
            finished.drain(..excess).collect()
        };
        if evicted.is_empty() {
            return;
        }

        let mut tasks = self.inner.tasks.write().await;
        for task_id in &evicted {
            tasks.remove(task_id);
        }
        debug!(evicted = evicted.len(), retained = tasks.len(), "Forgot finished tasks");
    }

    /// Worker body for one task
    async fn process(&self, task_id: TaskId, handler: String, payload: String) {
        // Closed semaphore means shutdown; the task was already cancelled
        let Ok(_permit) = self.inner.permits.clone().acquire_owned().await else {
            return;
        };

        if !self
            .transition(task_id, &TaskState::Queued, TaskState::Running)
            .await
        {
            debug!(task_id = %task_id, "Task no longer queued, skipping");
            return;
        }

        let started = Instant::now();
        let outcome = match TaskDescriptor::from_json(&payload) {
            Ok(task) => {
                let runner = Arc::clone(&self.inner.runner);
                match tokio::spawn(async move { runner.run(task).await }).await {
                    Ok(outcome) => outcome,
                    Err(join_error) => Err(format!("task panicked: {}", join_error)),
                }
            }
            Err(e) => Err(e.to_string()),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let id = task_id.to_string();
        match outcome {
            Ok(()) => {
                info!(task_id = %task_id, handler = %handler, duration_ms, "Task completed");
                if self
                    .transition(task_id, &TaskState::Running, TaskState::Completed)
                    .await
                {
                    self.retire(task_id).await;
                }
                self.publish(task_events::completed(&id, &handler, duration_ms))
                    .await;
            }
            Err(message) => {
                error!(task_id = %task_id, handler = %handler, error = %message, "Task failed");
                if self
                    .transition(
                        task_id,
                        &TaskState::Running,
                        TaskState::Failed(message.clone()),
                    )
                    .await
                {
                    self.retire(task_id).await;
                }
                self.publish(task_events::failed(&id, &handler, &message))
                    .await;
            }
        }
    }
}

fn cancel_if_pending(state: &mut TaskState) -> bool {
    if state.is_pending() {
        *state = TaskState::Cancelled;
        true
    } else {
        false
    }
}

#[async_trait]
impl TaskQueue for LocalQueue {
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    async fn enqueue(&self, task: TaskDescriptor) -> Result<PendingHandle, QueueError> {
        if !self.is_accepting() {
            return Err(QueueError::ShutDown(self.inner.config.name.clone()));
        }

        // Only the JSON form crosses into the worker
        let payload = task.to_json()?;
        let task_id = task.id;
        let handler = task.handler;

        {
            let (state, _) = watch::channel(TaskState::Queued);
            let mut tasks = self.inner.tasks.write().await;
            tasks.insert(
                task_id,
                TaskRecord {
                    handler: handler.clone(),
                    state,
                },
            );
        }

        debug!(task_id = %task_id, handler = %handler, "Task enqueued");
        self.publish(task_events::enqueued(&task_id.to_string(), &handler))
            .await;

        let queue = self.clone();
        tokio::spawn(async move { queue.process(task_id, handler, payload).await });

        Ok(PendingHandle::new(task_id, self.inner.config.name.clone()))
    }
}
