//! Ollama chat backend (local models)

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

/// Ollama provider
pub struct OllamaProvider {
    transport: HttpTransport,
    base_url: String,
    max_tokens: u32,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, max_tokens: u32) -> Result<Self, ProviderError> {
        Ok(Self {
            transport: HttpTransport::new()?,
            base_url: base_url.into(),
            max_tokens,
        })
    }

    pub fn from_entry(entry: &ProviderEntry) -> Result<Self, ProviderError> {
        let provider_type = ProviderType::Ollama;
        Self::new(
            entry.effective_base_url(&provider_type),
            entry.effective_max_tokens(&provider_type),
        )
    }

    fn build_request(&self, request: &ProviderRequest) -> OllamaRequest {
        let mut messages: Vec<OllamaMessage> =
            request.messages.iter().map(OllamaMessage::from).collect();

        // `format` constrains decoding; the instruction helps smaller models
        if let Some(output) = &request.output {
            messages.insert(0, OllamaMessage::system(output.instruction()));
        }

        let tools: Vec<OllamaTool> = request.tools.iter().map(OllamaTool::from).collect();

        OllamaRequest {
            model: request.model.clone(),
            messages,
            tools: (!tools.is_empty()).then_some(tools),
            format: request.output.as_ref().map(|o| o.schema.clone()),
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            },
            stream: false,
        }
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        let message = serde_json::from_str::<OllamaErrorResponse>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.to_string());

        if status == 404 || message.contains("not found") {
            return ProviderError::ModelNotAvailable(message);
        }
        ProviderError::from_http_status(status, &message)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Ollama
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        let url = join_url(&self.base_url, "api/chat");
        debug!(model = %body.model, %url, "Sending Ollama chat");

        let api_response: OllamaResponse = self
            .transport
            .post_json(
                request.client_options.as_ref(),
                &url,
                &[],
                &body,
                Self::parse_error_response,
            )
            .await?;

        let tool_calls: Vec<ToolCall> = api_response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall::new(format!("call_{}", i), tc.function.name, tc.function.arguments))
            .collect();

        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolUse
        } else {
            api_response
                .done_reason
                .as_deref()
                .map(FinishReason::parse)
                .unwrap_or(FinishReason::Stop)
        };

        Ok(ProviderResponse {
            content: ResponseContent::from_raw(
                api_response.message.content,
                request.output.is_some(),
            )?,
            tool_calls,
            usage: TokenUsage::new(
                api_response.prompt_eval_count.unwrap_or(0),
                api_response.eval_count.unwrap_or(0),
            ),
            finish_reason,
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
        })
    }
}

// ============================================================================
// Ollama API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
    /// Base64 images; Ollama has no document input
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

impl OllamaMessage {
    fn system(content: String) -> Self {
        Self {
            role: "system",
            content,
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    message: OllamaResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        let mut content = msg.content.clone();
        let mut images = Vec::new();
        for media in &msg.attachments {
            match media {
                Media::Image { .. } => images.push(media.to_base64()),
                // Text-like documents are inlined; binary ones cannot be sent
                Media::Document { bytes, title, .. } => {
                    if let Ok(text) = std::str::from_utf8(bytes) {
                        let heading = title.as_deref().unwrap_or("document");
                        content.push_str(&format!("\n\n[{}]\n{}", heading, text));
                    }
                }
            }
        }

        OllamaMessage {
            role,
            content,
            images,
        }
    }
}

impl From<&ToolDef> for OllamaTool {
    fn from(tool: &ToolDef) -> Self {
        OllamaTool {
            tool_type: "function",
            function: OllamaFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters_schema(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;

    fn provider() -> OllamaProvider {
        OllamaProvider::new("http://localhost:11434", 2048).unwrap()
    }

    #[test]
    fn test_build_request_options_and_images() {
        let request = ProviderRequest::new(ProviderType::Ollama, "llama3.2")
            .with_message(Message::user_with_media(
                "what is this",
                Media::image(vec![0u8, 1, 2], None),
            ))
            .with_top_p(0.9);

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 2048);
        assert!(body["options"].get("temperature").is_none());
        assert_eq!(body["messages"][0]["images"][0], "AAEC");
        assert!(body.get("format").is_none());
    }

    #[test]
    fn test_build_request_format_and_inline_document() {
        let request = ProviderRequest::new(ProviderType::Ollama, "llama3.2")
            .with_message(Message::user_with_media(
                "summarize",
                Media::document(b"hello".to_vec(), Some("text/plain".into()), Some("notes".into())),
            ))
            .with_output(OutputFormat::new("out", serde_json::json!({"type": "object"})));

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["format"]["type"], "object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "summarize\n\n[notes]\nhello");
    }

    #[test]
    fn test_model_not_found() {
        let err = OllamaProvider::parse_error_response(404, r#"{"error": "model 'x' not found"}"#);
        assert!(matches!(err, ProviderError::ModelNotAvailable(_)));
    }
}
