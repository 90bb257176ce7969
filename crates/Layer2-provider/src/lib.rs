//! # prism-provider
//!
//! LLM provider invocation boundary for Prism.
//! One request in, one complete response out.
//!
//! ## Features
//! - `Invoker` trait consumed by the transformation engine
//! - `Gateway` dispatching by `ProviderType` to HTTP backends
//!   (OpenAI-compatible, Anthropic, Ollama, Gemini)
//! - Per-request client timeouts
//! - Structured output (JSON Schema) with parsed responses
//! - Automatic retry with exponential backoff
//! - `MockProvider` for tests

pub mod error;
pub mod gateway;
pub mod message;
pub mod providers;
pub mod request;
pub mod retry;
pub mod tool_def;
pub mod r#trait;

// Core traits and types
pub use gateway::Gateway;
pub use message::{Message, MessageRole, ToolCall};
pub use r#trait::{
    FinishReason, Invoker, Provider, ProviderResponse, ResponseContent, TokenUsage,
};
pub use request::{ClientOptions, OutputFormat, ProviderRequest};
pub use tool_def::{ToolDef, ToolParameters};

// Error and retry
pub use error::ProviderError;
pub use retry::{with_retry, RetryClassification, RetryConfig, RetryableError};

// Provider implementations
pub use providers::{
    AnthropicProvider, GeminiProvider, HttpTransport, MockProvider, OllamaProvider,
    OpenAiProvider,
};
