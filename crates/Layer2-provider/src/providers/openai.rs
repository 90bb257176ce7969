//! OpenAI-compatible chat completions backend
//!
//! Serves OpenAI, Groq, Mistral, DeepSeek and xAI, which all accept the
//! `/chat/completions` wire format.

use super::{data_uri, join_url, HttpTransport};
use crate::{
    error::ProviderError,
    r#trait::{FinishReason, Provider, ProviderResponse, ResponseContent, TokenUsage},
    Message, MessageRole, ProviderRequest, ToolCall, ToolDef,
};
use async_trait::async_trait;
use prism_foundation::{Media, ProviderEntry, ProviderType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    transport: HttpTransport,
    provider_type: ProviderType,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(
        provider_type: ProviderType,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            transport: HttpTransport::new()?,
            provider_type,
            api_key: api_key.into(),
            base_url: base_url.into(),
            max_tokens,
        })
    }

    /// Build from a config entry
    pub fn from_entry(
        provider_type: ProviderType,
        entry: &ProviderEntry,
    ) -> Result<Self, ProviderError> {
        Self::new(
            provider_type,
            entry.api_key.clone().unwrap_or_default(),
            entry.effective_base_url(&provider_type),
            entry.effective_max_tokens(&provider_type),
        )
    }

    fn build_request(&self, request: &ProviderRequest) -> OpenAiRequest {
        let messages = request.messages.iter().map(OpenAiMessage::from).collect();

        let tools: Vec<OpenAiTool> = request.tools.iter().map(OpenAiTool::from).collect();

        let response_format = request.output.as_ref().map(|output| {
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": output.name,
                    "schema": output.schema,
                }
            })
        });

        OpenAiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            temperature: request.temperature,
            top_p: request.top_p,
            tools: (!tools.is_empty()).then_some(tools),
            response_format,
            stream: false,
        }
    }

    /// Parse error response from an OpenAI-compatible API
    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.code.as_deref() {
                Some("rate_limit_exceeded") => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                Some("context_length_exceeded") => ProviderError::ContextLengthExceeded(message),
                Some("invalid_api_key") => ProviderError::Authentication(message),
                Some("model_not_found") => ProviderError::ModelNotAvailable(message),
                _ => ProviderError::from_http_status(status, &message),
            };
        }

        ProviderError::from_http_status(status, body)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        let url = join_url(&self.base_url, "chat/completions");
        debug!(provider = %self.provider_type, model = %body.model, %url, "Sending chat completion");

        let headers = [("Authorization", format!("Bearer {}", self.api_key))];
        let api_response: OpenAiResponse = self
            .transport
            .post_json(
                request.client_options.as_ref(),
                &url,
                &headers,
                &body,
                Self::parse_error_response,
            )
            .await?;

        let choice =
            api_response.choices.into_iter().next().ok_or_else(|| {
                ProviderError::InvalidResponse("No choices in response".to_string())
            })?;

        let text = choice.message.content.unwrap_or_default();
        let content = ResponseContent::from_raw(text, request.output.is_some())?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let args = tc.function.arguments_parsed();
                ToolCall::new(tc.id, tc.function.name, args)
            })
            .collect();

        let usage = api_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ProviderResponse {
            content,
            tool_calls,
            usage,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::parse)
                .unwrap_or_default(),
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
        })
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: OpenAiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum OpenAiContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
    #[serde(rename = "file")]
    File { file: FileData },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct FileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    file_data: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// Response types
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

impl OpenAiFunctionCall {
    fn arguments_parsed(&self) -> serde_json::Value {
        serde_json::from_str(&self.arguments).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// Error types
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    code: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };

        if !msg.has_attachments() {
            return OpenAiMessage {
                role,
                content: OpenAiContent::Text(msg.content.clone()),
            };
        }

        let mut parts = Vec::with_capacity(msg.attachments.len() + 1);
        if !msg.content.is_empty() {
            parts.push(OpenAiContentPart::Text {
                text: msg.content.clone(),
            });
        }
        parts.extend(msg.attachments.iter().map(OpenAiContentPart::from));

        OpenAiMessage {
            role,
            content: OpenAiContent::Parts(parts),
        }
    }
}

impl From<&Media> for OpenAiContentPart {
    fn from(media: &Media) -> Self {
        let url = data_uri(media.mime_type(), &media.to_base64());
        match media {
            Media::Image { .. } => OpenAiContentPart::ImageUrl {
                image_url: ImageUrl { url },
            },
            Media::Document { title, .. } => OpenAiContentPart::File {
                file: FileData {
                    filename: title.clone(),
                    file_data: url,
                },
            },
        }
    }
}

impl From<&ToolDef> for OpenAiTool {
    fn from(tool: &ToolDef) -> Self {
        OpenAiTool {
            tool_type: "function",
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters_schema(),
            },
        }
    }
}
