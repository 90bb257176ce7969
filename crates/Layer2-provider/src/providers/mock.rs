//! Mock provider for testing
//!
//! Replays scripted outcomes in order, then repeats the default response.
//! Counts invocations and keeps the last request for assertions.

use crate::{
    error::ProviderError,
    r#trait::{Invoker, Provider, ProviderResponse},
    ProviderRequest,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use prism_foundation::ProviderType;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock LLM provider for testing
pub struct MockProvider {
    default_response: String,
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::with_response("Mock LLM response")
    }

    /// Create with custom default response
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue a response for the next call
    pub fn push_response(&self, response: ProviderResponse) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, error: ProviderError) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Number of invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().clone()
    }

    fn next_outcome(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        self.script.lock().pop_front().unwrap_or_else(|| {
            Ok(ProviderResponse::text(
                self.default_response.clone(),
                request.model.clone(),
            ))
        })
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Invoker for MockProvider {
    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.next_outcome(&request)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Openai
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.next_outcome(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, ResponseContent};

    fn request() -> ProviderRequest {
        ProviderRequest::new(ProviderType::Openai, "mock-model").with_message(Message::user("Test"))
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new();

        let response = provider.invoke(request()).await.unwrap();
        assert_eq!(response.content.as_text(), Some("Mock LLM response"));
        assert_eq!(response.model, "mock-model");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.last_request(), Some(request()));
    }

    #[tokio::test]
    async fn test_mock_provider_script() {
        let provider = MockProvider::with_response("fallback");
        provider
            .push_error(ProviderError::Timeout("slow".into()))
            .push_response(ProviderResponse::structured(
                serde_json::json!({"ok": true}),
                "mock-model",
            ));

        assert!(provider.invoke(request()).await.is_err());
        let second = provider.invoke(request()).await.unwrap();
        assert_eq!(
            second.content,
            ResponseContent::Structured(serde_json::json!({"ok": true}))
        );
        let third = provider.complete(&request()).await.unwrap();
        assert_eq!(third.content.as_text(), Some("fallback"));
        assert_eq!(provider.calls(), 3);
    }
}
