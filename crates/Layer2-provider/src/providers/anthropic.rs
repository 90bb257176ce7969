//! Anthropic Messages API backend

use super::{join_url, HttpTransport};
use crate::{
    error::ProviderError,
    r#trait::{FinishReason, Provider, ProviderResponse, ResponseContent, TokenUsage},
    Message, MessageRole, ProviderRequest, ToolCall, ToolDef,
};
use async_trait::async_trait;
use prism_foundation::{Media, ProviderEntry, ProviderType};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            transport: HttpTransport::new()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
            max_tokens,
        })
    }

    pub fn from_entry(entry: &ProviderEntry) -> Result<Self, ProviderError> {
        let provider_type = ProviderType::Anthropic;
        Self::new(
            entry.api_key.clone().unwrap_or_default(),
            entry.effective_base_url(&provider_type),
            entry.effective_max_tokens(&provider_type),
        )
    }

    fn build_request(&self, request: &ProviderRequest) -> AnthropicRequest {
        // No native schema mode; the schema rides along in the system prompt
        let schema_instruction = request.output.as_ref().map(|o| o.instruction());
        let system = match (request.system_text(), schema_instruction) {
            (Some(system), Some(schema)) => Some(format!("{}\n\n{}", system, schema)),
            (system, schema) => system.or(schema),
        };

        let messages = request
            .conversation()
            .map(AnthropicMessage::from)
            .collect();

        let tools: Vec<AnthropicTool> = request.tools.iter().map(AnthropicTool::from).collect();

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            system,
            messages,
            temperature: request.temperature,
            top_p: request.top_p,
            tools: (!tools.is_empty()).then_some(tools),
        }
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<AnthropicErrorResponse>(body) {
            let message = error_response.error.message;
            return match error_response.error.error_type.as_str() {
                "overloaded_error" => ProviderError::ServerError(message),
                "rate_limit_error" => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                "authentication_error" | "permission_error" => {
                    ProviderError::Authentication(message)
                }
                "not_found_error" => ProviderError::ModelNotAvailable(message),
                _ => ProviderError::from_http_status(status, &message),
            };
        }

        ProviderError::from_http_status(status, body)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Anthropic
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        let url = join_url(&self.base_url, "messages");
        debug!(model = %body.model, %url, "Sending Anthropic message");

        let headers = [
            ("x-api-key", self.api_key.clone()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ];
        let api_response: AnthropicResponse = self
            .transport
            .post_json(
                request.client_options.as_ref(),
                &url,
                &headers,
                &body,
                Self::parse_error_response,
            )
            .await?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in api_response.content {
            match block {
                ResponseBlock::Text { text: t } => text.push_str(&t),
                ResponseBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input))
                }
                ResponseBlock::Other => {}
            }
        }

        Ok(ProviderResponse {
            content: ResponseContent::from_raw(text, request.output.is_some())?,
            tool_calls,
            usage: TokenUsage::new(
                api_response.usage.input_tokens,
                api_response.usage.output_tokens,
            ),
            finish_reason: api_response
                .stop_reason
                .as_deref()
                .map(FinishReason::parse)
                .unwrap_or_default(),
            model: api_response.model,
        })
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<RequestBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock {
    Text { text: String },
    Image { source: MediaSource },
    Document {
        source: MediaSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct MediaSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&Message> for AnthropicMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::Assistant => "assistant",
            MessageRole::User | MessageRole::System => "user",
        };

        let mut content = Vec::with_capacity(msg.attachments.len() + 1);
        content.extend(msg.attachments.iter().map(RequestBlock::from));
        if !msg.content.is_empty() || content.is_empty() {
            content.push(RequestBlock::Text {
                text: msg.content.clone(),
            });
        }

        AnthropicMessage { role, content }
    }
}

impl From<&Media> for RequestBlock {
    fn from(media: &Media) -> Self {
        let fallback = match media {
            Media::Image { .. } => "image/png",
            Media::Document { .. } => "application/pdf",
        };
        let source = MediaSource {
            source_type: "base64",
            media_type: media.mime_type().unwrap_or(fallback).to_string(),
            data: media.to_base64(),
        };

        match media {
            Media::Image { .. } => RequestBlock::Image { source },
            Media::Document { title, .. } => RequestBlock::Document {
                source,
                title: title.clone(),
            },
        }
    }
}

impl From<&ToolDef> for AnthropicTool {
    fn from(tool: &ToolDef) -> Self {
        AnthropicTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.parameters_schema(),
        }
    }
}
