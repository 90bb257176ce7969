//! Google Gemini generateContent backend

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

/// Google Gemini provider
pub struct GeminiProvider {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl GeminiProvider {
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
        let provider_type = ProviderType::Gemini;
        Self::new(
            entry.api_key.clone().unwrap_or_default(),
            entry.effective_base_url(&provider_type),
            entry.effective_max_tokens(&provider_type),
        )
    }

    fn endpoint(&self, model: &str) -> String {
        join_url(&self.base_url, &format!("models/{}:generateContent", model))
    }

    fn build_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let mut system_parts = Vec::new();
        if let Some(system) = request.system_text() {
            system_parts.push(GeminiPart::Text { text: system });
        }
        if let Some(output) = &request.output {
            system_parts.push(GeminiPart::Text {
                text: output.instruction(),
            });
        }

        let contents = request.conversation().map(GeminiContent::from).collect();

        let declarations: Vec<GeminiFunctionDeclaration> = request
            .tools
            .iter()
            .map(GeminiFunctionDeclaration::from)
            .collect();
        let tools = (!declarations.is_empty()).then(|| {
            vec![GeminiTool {
                function_declarations: declarations,
            }]
        });

        GeminiRequest {
            contents,
            tools,
            system_instruction: (!system_parts.is_empty())
                .then_some(GeminiSystemInstruction { parts: system_parts }),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
                temperature: request.temperature,
                top_p: request.top_p,
                response_mime_type: request.output.as_ref().map(|_| "application/json"),
            },
        }
    }

    fn parse_error_response(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(body) {
            let error = error_response.error;
            return match error.status.as_deref() {
                Some("RESOURCE_EXHAUSTED") => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED") => {
                    ProviderError::Authentication(error.message)
                }
                Some("NOT_FOUND") => ProviderError::ModelNotAvailable(error.message),
                _ => ProviderError::from_http_status(status, &error.message),
            };
        }

        ProviderError::from_http_status(status, body)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(request);
        let url = self.endpoint(&request.model);
        debug!(model = %request.model, %url, "Sending Gemini generateContent");

        let headers = [("x-goog-api-key", self.api_key.clone())];
        let api_response: GeminiResponse = self
            .transport
            .post_json(
                request.client_options.as_ref(),
                &url,
                &headers,
                &body,
                Self::parse_error_response,
            )
            .await?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".into()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for (i, part) in candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
        {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall::new(format!("call_{}", i), call.name, call.args));
            }
        }

        let usage = api_response.usage_metadata.unwrap_or_default();
        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolUse
        } else {
            candidate
                .finish_reason
                .as_deref()
                .map(FinishReason::parse)
                .unwrap_or_default()
        };

        Ok(ProviderResponse {
            content: ResponseContent::from_raw(text, request.output.is_some())?,
            tool_calls,
            usage: TokenUsage::new(
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
            ),
            finish_reason,
            model: api_response
                .model_version
                .unwrap_or_else(|| request.model.clone()),
        })
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// Response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

// Error types
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    status: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&Message> for GeminiContent {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::Assistant => "model",
            MessageRole::User | MessageRole::System => "user",
        };

        let mut parts: Vec<GeminiPart> = msg.attachments.iter().map(GeminiPart::from).collect();
        if !msg.content.is_empty() || parts.is_empty() {
            parts.push(GeminiPart::Text {
                text: msg.content.clone(),
            });
        }

        GeminiContent { role, parts }
    }
}

impl From<&Media> for GeminiPart {
    fn from(media: &Media) -> Self {
        GeminiPart::InlineData {
            inline_data: GeminiBlob {
                mime_type: media
                    .mime_type()
                    .unwrap_or("application/octet-stream")
                    .to_string(),
                data: media.to_base64(),
            },
        }
    }
}

impl From<&ToolDef> for GeminiFunctionDeclaration {
    fn from(tool: &ToolDef) -> Self {
        GeminiFunctionDeclaration {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters_schema(),
        }
    }
}
