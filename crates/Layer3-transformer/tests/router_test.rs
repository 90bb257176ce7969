//! Execution router tests: inline and queued paths

use prism_foundation::{
    CacheConfig, Content, Context, Error, EventBus, Media, PrismConfig, ResultCache,
    StoreRegistry,
};
use prism_provider::MockProvider;
use prism_queue::{LocalQueue, TaskState};
use prism_transformer::{
    Dispatch, ExecutionRouter, HandlerRegistry, InlineTransformer, ResultData,
    TransformationEngine, TransformerHandler, TransformerResult,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    mock: Arc<MockProvider>,
    events: Arc<EventBus>,
    router: ExecutionRouter,
    queue: LocalQueue,
}

fn harness() -> Harness {
    let mock = Arc::new(MockProvider::with_response("done"));
    let events = Arc::new(EventBus::new());
    let cache = ResultCache::for_transformations(
        &CacheConfig::default(),
        Arc::new(StoreRegistry::in_memory()),
    );
    let engine = TransformationEngine::new(Arc::new(PrismConfig::default()), cache, mock.clone());

    let router = ExecutionRouter::new(engine, HandlerRegistry::new());
    let queue = LocalQueue::new(Arc::new(router.job_runner())).with_events(events.clone());
    let router = router.with_queue(Arc::new(queue.clone()));

    Harness {
        mock,
        events,
        router,
        queue,
    }
}

fn summarizer() -> TransformerHandler {
    TransformerHandler::transformer(InlineTransformer::new("summarize", "Summarize"))
}

fn context_with(key: &str, value: serde_json::Value) -> Context {
    let mut context = Context::new();
    context.insert(key.to_string(), value);
    context
}

// ============================================================================
// Handler validation
// ============================================================================

#[tokio::test]
async fn test_missing_handler_is_rejected_on_both_paths() {
    let h = harness();

    for queued in [false, true] {
        let err = h
            .router
            .run(Content::text("x"), None, Context::new(), queued)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHandler(_)));
    }

    assert_eq!(h.mock.calls(), 0);
    assert_eq!(h.queue.stats().await.total(), 0);
}

#[tokio::test]
async fn test_unregistered_handler_cannot_be_queued() {
    let h = harness();
    let handler = summarizer();

    let err = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidHandler(_)));
    assert_eq!(h.queue.stats().await.total(), 0);
}

#[tokio::test]
async fn test_same_name_different_transformer_cannot_be_queued() {
    let h = harness();
    h.router.registry().register(TransformerHandler::transformer(
        InlineTransformer::new("summarize", "Registered prompt"),
    ));
    let passed =
        TransformerHandler::transformer(InlineTransformer::new("summarize", "Passed prompt"));

    let err = h
        .router
        .run(Content::text("x"), Some(&passed), Context::new(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidHandler(_)));
    assert_eq!(h.queue.stats().await.total(), 0);
    assert_eq!(h.mock.calls(), 0);
}

#[tokio::test]
async fn test_same_name_different_closure_cannot_be_queued() {
    let h = harness();
    h.router
        .registry()
        .register(TransformerHandler::closure("noop", |_, _| async { Ok(None) }));
    let passed = TransformerHandler::closure("noop", |_, _| async { Ok(None) });

    let err = h
        .router
        .run(Content::text("x"), Some(&passed), Context::new(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidHandler(_)));
}

#[tokio::test]
async fn test_queued_and_inline_send_the_same_prompt() {
    let h = harness();
    let handler =
        TransformerHandler::transformer(InlineTransformer::new("summarize", "Passed prompt"));
    h.router.registry().register(handler.clone());

    let dispatch = h
        .router
        .run(Content::text("queued"), Some(&handler), Context::new(), true)
        .await
        .unwrap();
    let task_id = dispatch.pending().unwrap().task_id;
    assert_eq!(h.queue.wait(task_id, WAIT).await.unwrap(), TaskState::Completed);
    let queued_prompt = h.mock.last_request().unwrap().messages[0].content.clone();

    h.router
        .run(Content::text("inline"), Some(&handler), Context::new(), false)
        .await
        .unwrap();
    let inline_prompt = h.mock.last_request().unwrap().messages[0].content.clone();

    assert_eq!(queued_prompt, "Passed prompt");
    assert_eq!(inline_prompt, queued_prompt);
}

#[test]
fn test_clones_are_the_same_handler() {
    let handler = summarizer();

    assert!(handler.is_same(&handler.clone()));
    assert!(!handler.is_same(&summarizer()));
}

// ============================================================================
// Inline path
// ============================================================================

#[tokio::test]
async fn test_inline_transformer_returns_result() {
    let h = harness();
    let handler = summarizer();

    let dispatch = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), false)
        .await
        .unwrap();

    assert_eq!(dispatch.result().and_then(TransformerResult::text), Some("done"));
    assert!(dispatch.pending().is_none());
}

#[tokio::test]
async fn test_inline_closure_error_propagates() {
    let h = harness();
    let handler = TransformerHandler::closure("explode", |_, _| async {
        Err(Error::Transformer("exploded".into()))
    });

    let err = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), false)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), Error::Transformer("exploded".into()).to_string());
}

#[tokio::test]
async fn test_inline_closure_may_return_nothing() {
    let h = harness();
    let handler = TransformerHandler::closure("noop", |_, _| async { Ok(None) });

    let dispatch = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), false)
        .await
        .unwrap();

    assert_eq!(dispatch, Dispatch::Completed(None));
}

// ============================================================================
// Queued path
// ============================================================================

#[tokio::test]
async fn test_queued_transformer_runs_and_fills_cache() {
    let h = harness();
    let handler = summarizer();
    h.router.registry().register(handler.clone());

    let dispatch = h
        .router
        .run(Content::text("queued input"), Some(&handler), Context::new(), true)
        .await
        .unwrap();

    let pending = dispatch.pending().cloned().unwrap();
    assert_eq!(pending.queue, "local");
    assert_eq!(h.queue.wait(pending.task_id, WAIT).await.unwrap(), TaskState::Completed);

    // The queued run populated the cache, so an inline run does not invoke again
    let inline = h
        .router
        .run(Content::text("queued input"), Some(&handler), Context::new(), false)
        .await
        .unwrap();
    assert_eq!(inline.result().and_then(TransformerResult::text), Some("done"));
    assert_eq!(h.mock.calls(), 1);
}

#[tokio::test]
async fn test_queued_media_and_context_survive_the_boundary() {
    let h = harness();
    let seen: Arc<Mutex<Option<(Content, Context)>>> = Arc::new(Mutex::new(None));

    let sink = seen.clone();
    let handler = TransformerHandler::closure("capture", move |content, context| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = Some((content, context));
            Ok(None)
        }
    });
    h.router.registry().register(handler.clone());

    let document = Media::document(
        b"%PDF-1.7 bytes".to_vec(),
        Some("application/pdf".into()),
        Some("Quarterly report".into()),
    );
    let context = context_with("tenant", serde_json::json!("acme"));

    let dispatch = h
        .router
        .run(Content::Media(document.clone()), Some(&handler), context.clone(), true)
        .await
        .unwrap();
    let task_id = dispatch.pending().unwrap().task_id;
    assert_eq!(h.queue.wait(task_id, WAIT).await.unwrap(), TaskState::Completed);

    let (content, received) = seen.lock().unwrap().take().unwrap();
    assert_eq!(content, Content::Media(document));
    assert_eq!(received, context);
}

#[tokio::test]
async fn test_queued_failure_is_reported_as_event() {
    let h = harness();
    let mut rx = h.events.receiver();

    let handler = TransformerHandler::closure("broken", |_, _| async {
        Ok(Some(TransformerResult::failed(vec!["model refused".into()], None)))
    });
    h.router.registry().register(handler.clone());

    let dispatch = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), true)
        .await
        .unwrap();
    let task_id = dispatch.pending().unwrap().task_id;

    let state = h.queue.wait(task_id, WAIT).await.unwrap();
    assert_eq!(state, TaskState::Failed("model refused".into()));

    let failed = loop {
        let event = rx.recv().await.unwrap();
        if event.event_type == "task.failed" {
            break event;
        }
    };
    assert_eq!(failed.data["handler"], "broken");
    assert_eq!(failed.data["error"], "model refused");
}

#[tokio::test]
async fn test_enqueue_after_shutdown_is_a_queue_error() {
    let h = harness();
    let handler = TransformerHandler::closure("echo", |content: Content, _| async move {
        Ok(Some(TransformerResult::successful(
            ResultData::Text(content.as_text().unwrap_or_default().to_string()),
            None,
        )))
    });
    h.router.registry().register(handler.clone());

    h.queue.shutdown().await;
    let err = h
        .router
        .run(Content::text("x"), Some(&handler), Context::new(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Queue(_)));
}
