//! Provider trait and common types
//!
//! - `Provider`: 하나의 HTTP 백엔드 (OpenAI 호환, Anthropic, Ollama, Gemini)
//! - `Invoker`: 상위 레이어가 의존하는 호출 경계 (Gateway, MockProvider)

use crate::error::ProviderError;
use crate::{ProviderRequest, ToolCall};
use async_trait::async_trait;
use prism_foundation::ProviderType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LLM Provider trait
///
/// Implement this trait to add support for a new wire format.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider this backend talks to
    fn provider_type(&self) -> ProviderType;

    /// Send the request and wait for the complete response
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// The invocation boundary used by the transformation engine
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseContent {
    Text(String),
    /// Parsed JSON, produced when the request asked for an output format
    Structured(Value),
}

impl ResponseContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseContent::Text(text) => Some(text),
            ResponseContent::Structured(_) => None,
        }
    }

    /// Parse raw model text as structured output
    ///
    /// Models often wrap JSON in a markdown fence; the fence is stripped first.
    pub fn parse_structured(raw: &str) -> Result<Self, ProviderError> {
        let trimmed = strip_code_fence(raw.trim());
        serde_json::from_str(trimmed)
            .map(ResponseContent::Structured)
            .map_err(|e| {
                ProviderError::InvalidResponse(format!("structured output is not JSON: {}", e))
            })
    }

    /// Text or structured, depending on whether an output format was requested
    pub fn from_raw(raw: String, structured: bool) -> Result<Self, ProviderError> {
        if structured {
            Self::parse_structured(&raw)
        } else {
            Ok(ResponseContent::Text(raw))
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the optional language tag on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Complete response from provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub content: ResponseContent,

    /// Tool calls (if any)
    pub tool_calls: Vec<ToolCall>,

    pub usage: TokenUsage,

    pub finish_reason: FinishReason,

    /// Model used (may differ from requested if aliased)
    pub model: String,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: ResponseContent::Text(text.into()),
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
            model: model.into(),
        }
    }

    pub fn structured(value: Value, model: impl Into<String>) -> Self {
        Self {
            content: ResponseContent::Structured(value),
            ..Self::text(String::new(), model)
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        if !tool_calls.is_empty() {
            self.finish_reason = FinishReason::ToolUse;
        }
        self.tool_calls = tool_calls;
        self
    }
}

/// Reason for completion finishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinishReason {
    /// Completed naturally
    Stop,

    /// Hit max tokens limit
    MaxTokens,

    /// Tool use requested
    ToolUse,

    /// Content filtered
    ContentFilter,

    /// Unknown/other
    #[default]
    Other,
}

impl FinishReason {
    /// Map the provider-specific finish/stop reason string
    pub fn parse(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" | "STOP" | "stop_sequence" => FinishReason::Stop,
            "length" | "max_tokens" | "MAX_TOKENS" => FinishReason::MaxTokens,
            "tool_calls" | "tool_use" | "function_call" => FinishReason::ToolUse,
            "content_filter" | "SAFETY" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}
