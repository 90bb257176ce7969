//! LLM Gateway - routes requests to the provider named in the request
//!
//! The Gateway owns one backend per configured provider and implements
//! [`Invoker`] so the transformation layer never sees concrete backends.

use crate::{
    providers::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider},
    retry::{with_retry, RetryConfig},
    Invoker, Provider, ProviderError, ProviderRequest, ProviderResponse,
};
use async_trait::async_trait;
use prism_foundation::{ProviderConfig, ProviderEntry, ProviderType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Gateway that manages multiple LLM providers
pub struct Gateway {
    providers: HashMap<ProviderType, Arc<dyn Provider>>,
    retry_config: RetryConfig,
}

impl Gateway {
    /// Create an empty gateway (for testing or manual provider setup)
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Create a gateway with a backend for every usable configured provider
    ///
    /// Entries without a required API key are skipped; requests for them
    /// fail with `NotConfigured`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut gateway = Self::new();

        for (provider_type, entry) in config.list_usable() {
            let provider = Self::build_provider(*provider_type, entry)?;
            debug!(provider = %provider_type, "Registered provider backend");
            gateway.providers.insert(*provider_type, provider);
        }

        Ok(gateway)
    }

    fn build_provider(
        provider_type: ProviderType,
        entry: &ProviderEntry,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let provider: Arc<dyn Provider> = match provider_type {
            ProviderType::Anthropic => Arc::new(AnthropicProvider::from_entry(entry)?),
            ProviderType::Ollama => Arc::new(OllamaProvider::from_entry(entry)?),
            ProviderType::Gemini => Arc::new(GeminiProvider::from_entry(entry)?),
            ProviderType::Openai
            | ProviderType::Groq
            | ProviderType::Mistral
            | ProviderType::Deepseek
            | ProviderType::Xai => Arc::new(OpenAiProvider::from_entry(provider_type, entry)?),
        };
        Ok(provider)
    }

    /// Add or replace the backend for the provider's type
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.add_provider(provider);
        self
    }

    pub fn add_provider(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.provider_type(), provider);
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Get a specific provider
    pub fn get_provider(&self, provider_type: ProviderType) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers.get(&provider_type).cloned().ok_or_else(|| {
            let hint = provider_type
                .api_key_env()
                .map(|env| format!(" (set {})", env))
                .unwrap_or_default();
            ProviderError::NotConfigured(format!("{}{}", provider_type, hint))
        })
    }

    /// Configured providers, sorted by id
    pub fn list_providers(&self) -> Vec<ProviderType> {
        let mut providers: Vec<_> = self.providers.keys().copied().collect();
        providers.sort_by_key(|p| p.id());
        providers
    }

    pub fn has_provider(&self, provider_type: ProviderType) -> bool {
        self.providers.contains_key(&provider_type)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Invoker for Gateway {
    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let provider = self.get_provider(request.provider)?;
        info!(
            provider = %request.provider,
            model = %request.model,
            messages = request.messages.len(),
            "Invoking provider"
        );

        let operation = format!("{} completion", request.provider);
        with_retry(&self.retry_config, &operation, || provider.complete(&request)).await
    }
}
