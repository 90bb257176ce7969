//! Gateway tests against a mock HTTP server

use prism_foundation::{ProviderConfig, ProviderEntry, ProviderType};
use prism_provider::{
    ClientOptions, Gateway, Invoker, Message, OutputFormat, ProviderError, ProviderRequest,
    ResponseContent, RetryConfig,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(provider_type: ProviderType, server: &MockServer) -> Gateway {
    let mut config = ProviderConfig::new();
    config.add(
        provider_type,
        ProviderEntry::new().api_key("test-key").base_url(server.uri()),
    );
    Gateway::from_config(&config)
        .unwrap()
        .with_retry_config(RetryConfig::immediate(2))
}

fn openai_completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3}
    })
}

#[tokio::test]
async fn test_openai_text_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "Summarize"},
                {"role": "user", "content": "long text"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_completion("short")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Openai, &server);
    let request = ProviderRequest::new(ProviderType::Openai, "gpt-4o-mini")
        .with_message(Message::system("Summarize"))
        .with_message(Message::user("long text"))
        .with_temperature(0.0);

    let response = gateway.invoke(request).await.unwrap();
    assert_eq!(response.content, ResponseContent::Text("short".into()));
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 3);
}

#[tokio::test]
async fn test_openai_compatible_structured_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "response_format": {"type": "json_schema"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(openai_completion(r#"{"tags": ["a", "b"]}"#)),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Deepseek, &server);
    let request = ProviderRequest::new(ProviderType::Deepseek, "deepseek-chat")
        .with_message(Message::user("tag this"))
        .with_output(OutputFormat::new(
            "tags",
            serde_json::json!({"type": "object", "properties": {"tags": {"type": "array"}}}),
        ));

    let response = gateway.invoke(request).await.unwrap();
    assert_eq!(
        response.content,
        ResponseContent::Structured(serde_json::json!({"tags": ["a", "b"]}))
    );
}

#[tokio::test]
async fn test_server_error_retried_then_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Openai, &server);
    let request =
        ProviderRequest::new(ProviderType::Openai, "gpt-4o-mini").with_message(Message::user("hi"));

    let err = gateway.invoke(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::ServerError(_)));
}

#[tokio::test]
async fn test_authentication_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key", "code": "invalid_api_key"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Openai, &server);
    let request =
        ProviderRequest::new(ProviderType::Openai, "gpt-4o-mini").with_message(Message::user("hi"));

    let err = gateway.invoke(request).await.unwrap_err();
    assert_eq!(err, ProviderError::Authentication("Incorrect API key".into()));
}

#[tokio::test]
async fn test_per_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_completion("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Openai, &server);
    let request = ProviderRequest::new(ProviderType::Openai, "gpt-4o-mini")
        .with_message(Message::user("hi"))
        .with_client_options(ClientOptions::new(Some(1), None));

    let err = gateway.invoke(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)));
}

#[tokio::test]
async fn test_anthropic_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({"system": "be brief"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "ok"}],
            "model": "claude-3-5-haiku-latest",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 4, "output_tokens": 1}
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Anthropic, &server);
    let request = ProviderRequest::new(ProviderType::Anthropic, "claude-3-5-haiku-latest")
        .with_message(Message::system("be brief"))
        .with_message(Message::user("hello"));

    let response = gateway.invoke(request).await.unwrap();
    assert_eq!(response.content.as_text(), Some("ok"));
    assert_eq!(response.model, "claude-3-5-haiku-latest");
}

#[tokio::test]
async fn test_ollama_chat() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "local"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 7,
            "eval_count": 2
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Ollama, &server);
    let request =
        ProviderRequest::new(ProviderType::Ollama, "llama3.2").with_message(Message::user("hi"));

    let response = gateway.invoke(request).await.unwrap();
    assert_eq!(response.content.as_text(), Some("local"));
    assert_eq!(response.usage.total(), 9);
}

#[tokio::test]
async fn test_gemini_generate_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "gem"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 1}
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(ProviderType::Gemini, &server);
    let request = ProviderRequest::new(ProviderType::Gemini, "gemini-2.0-flash")
        .with_message(Message::user("hi"));

    let response = gateway.invoke(request).await.unwrap();
    assert_eq!(response.content.as_text(), Some("gem"));
    assert_eq!(response.model, "gemini-2.0-flash");
}
