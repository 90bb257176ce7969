//! Provider request - 한 번의 LLM 호출에 필요한 모든 설정
//!
//! `ProviderRequest`는 빌더 스타일로 구성되며, 설정되지 않은 항목은
//! 와이어 포맷에서도 생략됩니다.

use crate::{Message, ToolDef};
use prism_foundation::ProviderType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Per-request HTTP client settings (seconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
}

impl ClientOptions {
    pub fn new(timeout: Option<u64>, connect_timeout: Option<u64>) -> Self {
        Self {
            timeout,
            connect_timeout,
        }
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn connect_timeout_duration(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }

    pub fn is_empty(&self) -> bool {
        self.timeout.is_none() && self.connect_timeout.is_none()
    }
}

/// Structured output request: a named JSON Schema the response must follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub name: String,
    pub schema: Value,
}

impl OutputFormat {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Instruction text for providers without native schema support
    pub fn instruction(&self) -> String {
        format!(
            "Respond only with a JSON document named \"{}\" that validates against this JSON Schema:\n{}",
            self.name, self.schema
        )
    }
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub provider: ProviderType,
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub tools: Vec<ToolDef>,
    pub client_options: Option<ClientOptions>,
    pub output: Option<OutputFormat>,
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    pub fn new(provider: ProviderType, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            top_p: None,
            tools: Vec::new(),
            client_options: None,
            output: None,
            max_tokens: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDef>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = Some(options);
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// System messages joined with blank lines, for wire formats that take
    /// the system prompt as a separate field
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == crate::MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    /// Non-system messages
    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.role != crate::MessageRole::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ProviderRequest::new(ProviderType::Anthropic, "claude-3-5-haiku-latest")
            .with_message(Message::system("be brief"))
            .with_message(Message::system("summarize"))
            .with_message(Message::user("text"))
            .with_temperature(0.2)
            .with_client_options(ClientOptions::new(Some(30), None));

        assert_eq!(request.system_text().as_deref(), Some("be brief\n\nsummarize"));
        assert_eq!(request.conversation().count(), 1);
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.top_p.is_none());
        assert_eq!(
            request.client_options.and_then(|o| o.timeout_duration()),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_system_text_absent() {
        let request =
            ProviderRequest::new(ProviderType::Openai, "gpt-4o-mini").with_message(Message::user("hi"));
        assert!(request.system_text().is_none());
    }
}
