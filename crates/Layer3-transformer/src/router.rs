//! Execution router - inline or queued transformation
//!
//! ```text
//! run(content, handler, context, queued)
//!   ├ handler = None            → InvalidHandler
//!   ├ queued = false            → handler runs here, errors propagate
//!   └ queued = true
//!       ├ name not registered   → InvalidHandler
//!       ├ other handler by name → InvalidHandler
//!       └ Content → QueueableContent → TaskDescriptor → TaskQueue
//!                                         │
//!           TransformerJobRunner ◄────────┘ (decode, look up handler, run)
//! ```
//!
//! Closures are queueable only through the registry: the handler name is
//! the only part of a handler that crosses the queue boundary. A queued run
//! is accepted only when the registry holds the very handler passed in, so
//! both paths run the same logic.

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use prism_foundation::{Content, Context, Error, QueueableContent, Result};
use prism_queue::{PendingHandle, TaskDescriptor, TaskQueue, TaskRunner};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::TransformationEngine;
use crate::result::TransformerResult;
use crate::transformer::Transformer;

// ============================================================================
// Handlers
// ============================================================================

pub type HandlerFuture = BoxFuture<'static, Result<Option<TransformerResult>>>;
pub type HandlerFn = Arc<dyn Fn(Content, Context) -> HandlerFuture + Send + Sync>;

/// Something the router can run over content
#[derive(Clone)]
pub enum TransformerHandler {
    /// Runs through the transformation engine
    Transformer(Arc<dyn Transformer>),

    /// Named async closure, run as is
    Closure { name: String, func: HandlerFn },
}

impl TransformerHandler {
    pub fn transformer(transformer: impl Transformer + 'static) -> Self {
        TransformerHandler::Transformer(Arc::new(transformer))
    }

    pub fn closure<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Content, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<TransformerResult>>> + Send + 'static,
    {
        TransformerHandler::Closure {
            name: name.into(),
            func: Arc::new(move |content, context| Box::pin(f(content, context))),
        }
    }

    /// Registry key and queued representation
    pub fn name(&self) -> &str {
        match self {
            TransformerHandler::Transformer(transformer) => transformer.name(),
            TransformerHandler::Closure { name, .. } => name,
        }
    }

    /// Same underlying transformer or closure, not merely the same name
    pub fn is_same(&self, other: &TransformerHandler) -> bool {
        match (self, other) {
            (TransformerHandler::Transformer(a), TransformerHandler::Transformer(b)) => {
                same_allocation(a, b)
            }
            (
                TransformerHandler::Closure { name: a, func: f },
                TransformerHandler::Closure { name: b, func: g },
            ) => a == b && same_allocation(f, g),
            _ => false,
        }
    }

    async fn invoke(
        &self,
        engine: &TransformationEngine,
        content: Content,
        context: Context,
    ) -> Result<Option<TransformerResult>> {
        match self {
            TransformerHandler::Transformer(transformer) => Ok(Some(
                engine.execute(transformer.as_ref(), &content, &context).await,
            )),
            TransformerHandler::Closure { func, .. } => func(content, context).await,
        }
    }
}

// Data pointers only; vtable pointers for one type may differ across codegen units
fn same_allocation<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl std::fmt::Debug for TransformerHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformerHandler::Transformer(t) => {
                f.debug_tuple("Transformer").field(&t.name()).finish()
            }
            TransformerHandler::Closure { name, .. } => {
                f.debug_struct("Closure").field("name", name).finish()
            }
        }
    }
}

impl<T: Transformer + 'static> From<Arc<T>> for TransformerHandler {
    fn from(transformer: Arc<T>) -> Self {
        TransformerHandler::Transformer(transformer)
    }
}

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Handlers by name, shared between router and job runner
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<String, TransformerHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the handler's name, returning any replaced handler
    pub fn register(&self, handler: TransformerHandler) -> Option<TransformerHandler> {
        let name = handler.name().to_string();
        debug!(handler = %name, "Registering handler");
        self.handlers.write().insert(name, handler)
    }

    pub fn unregister(&self, name: &str) -> Option<TransformerHandler> {
        self.handlers.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<TransformerHandler> {
        self.handlers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

// ============================================================================
// ExecutionRouter
// ============================================================================

/// Outcome of [`ExecutionRouter::run`]
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Ran inline; closures may return no result
    Completed(Option<TransformerResult>),

    /// Accepted by the queue
    Pending(PendingHandle),
}

impl Dispatch {
    pub fn result(&self) -> Option<&TransformerResult> {
        match self {
            Dispatch::Completed(result) => result.as_ref(),
            Dispatch::Pending(_) => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingHandle> {
        match self {
            Dispatch::Pending(handle) => Some(handle),
            Dispatch::Completed(_) => None,
        }
    }
}

/// Chooses between inline execution and the task queue
#[derive(Clone)]
pub struct ExecutionRouter {
    engine: TransformationEngine,
    registry: HandlerRegistry,
    queue: Option<Arc<dyn TaskQueue>>,
}

impl ExecutionRouter {
    pub fn new(engine: TransformationEngine, registry: HandlerRegistry) -> Self {
        Self {
            engine,
            registry,
            queue: None,
        }
    }

    pub fn with_queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn engine(&self) -> &TransformationEngine {
        &self.engine
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Runner to hand to a queue that feeds back into this router's handlers
    pub fn job_runner(&self) -> TransformerJobRunner {
        TransformerJobRunner::new(self.engine.clone(), self.registry.clone())
    }

    pub async fn run(
        &self,
        content: Content,
        handler: Option<&TransformerHandler>,
        context: Context,
        queued: bool,
    ) -> Result<Dispatch> {
        let handler =
            handler.ok_or_else(|| Error::InvalidHandler("no handler given".to_string()))?;

        if !queued {
            debug!(handler = handler.name(), "Running handler inline");
            let result = handler.invoke(&self.engine, content, context).await?;
            return Ok(Dispatch::Completed(result));
        }

        // The runner resolves the name again, so it must find this exact handler
        let name = handler.name();
        match self.registry.get(name) {
            Some(registered) if registered.is_same(handler) => {}
            Some(_) => {
                return Err(Error::InvalidHandler(format!(
                    "a different handler is registered as '{}'",
                    name
                )));
            }
            None => {
                return Err(Error::InvalidHandler(format!(
                    "handler '{}' is not registered and cannot be queued",
                    name
                )));
            }
        }

        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| Error::Queue("no task queue configured".to_string()))?;

        let payload = serde_json::to_value(content.to_queueable())?;
        let descriptor = TaskDescriptor::new(name, payload, context);
        let handle = queue.enqueue(descriptor).await?;

        info!(
            handler = name,
            task_id = %handle.task_id,
            queue = %handle.queue,
            "Transformation queued"
        );
        Ok(Dispatch::Pending(handle))
    }
}

// ============================================================================
// TransformerJobRunner
// ============================================================================

/// Runs queued transformations
///
/// A failed [`TransformerResult`] fails the task with the joined error
/// messages.
#[derive(Clone)]
pub struct TransformerJobRunner {
    engine: TransformationEngine,
    registry: HandlerRegistry,
}

impl TransformerJobRunner {
    pub fn new(engine: TransformationEngine, registry: HandlerRegistry) -> Self {
        Self { engine, registry }
    }
}

#[async_trait]
impl TaskRunner for TransformerJobRunner {
    async fn run(&self, task: TaskDescriptor) -> std::result::Result<(), String> {
        let handler = self.registry.get(&task.handler).ok_or_else(|| {
            Error::InvalidHandler(format!("handler '{}' is not registered", task.handler))
                .to_string()
        })?;

        let content = serde_json::from_value::<QueueableContent>(task.content)
            .map_err(Error::from)
            .and_then(QueueableContent::into_content)
            .map_err(|e| e.to_string())?;

        match handler.invoke(&self.engine, content, task.context).await {
            Ok(Some(result)) if !result.is_successful() => Err(result.errors().join("; ")),
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}
