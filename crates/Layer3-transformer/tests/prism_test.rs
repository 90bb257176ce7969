//! Facade tests: fluent calls over wired services

use prism_foundation::{Context, Error, Media, PrismConfig};
use prism_provider::MockProvider;
use prism_queue::TaskState;
use prism_transformer::{InlineTransformer, Prism, PrismServices, TransformerHandler};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn services(mock: Arc<MockProvider>) -> PrismServices {
    PrismServices::new(PrismConfig::default(), mock).unwrap()
}

fn summarizer() -> TransformerHandler {
    TransformerHandler::transformer(InlineTransformer::new("summarize", "Summarize"))
}

#[tokio::test]
async fn test_text_inline() {
    let mock = Arc::new(MockProvider::with_response("summary"));
    let services = services(mock.clone());

    let dispatch = Prism::new(&services)
        .text("long text")
        .using(summarizer())
        .run()
        .await
        .unwrap();

    assert_eq!(dispatch.result().and_then(|r| r.text()), Some("summary"));
    assert_eq!(mock.last_request().unwrap().messages[1].content, "long text");
}

#[tokio::test]
async fn test_url_is_fetched_before_transforming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("page text"))
        .expect(1)
        .mount(&server)
        .await;

    let mock = Arc::new(MockProvider::new());
    let services = services(mock.clone());

    for _ in 0..2 {
        Prism::new(&services)
            .url(server.uri())
            .using(summarizer())
            .run()
            .await
            .unwrap();
    }

    let request = mock.last_request().unwrap();
    assert_eq!(request.messages.last().unwrap().content, "page text");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_missing_handler_skips_fetch() {
    let services = services(Arc::new(MockProvider::new()));

    let err = Prism::new(&services)
        .url("http://127.0.0.1:1/never-fetched")
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidHandler(_)));
}

#[tokio::test]
async fn test_missing_content() {
    let services = services(Arc::new(MockProvider::new()));

    let err = Prism::new(&services).using(summarizer()).run().await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_queued_media() {
    let mock = Arc::new(MockProvider::with_response("a cat"));
    let services = services(mock.clone());
    let handler = TransformerHandler::transformer(InlineTransformer::new("describe", "Describe"));
    services.register(handler.clone());

    let mut context = Context::new();
    context.insert("request_id".into(), serde_json::json!("r-1"));

    let image = Media::image(vec![1, 2, 3, 4], Some("image/png".into()));
    let dispatch = Prism::new(&services)
        .media(image.clone())
        .using(handler)
        .with_context(context)
        .queued()
        .run()
        .await
        .unwrap();

    let task_id = dispatch.pending().unwrap().task_id;
    let state = services
        .queue()
        .wait(task_id, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(state, TaskState::Completed);
    let request = mock.last_request().unwrap();
    assert_eq!(request.messages.last().unwrap().attachments, vec![image]);
}
