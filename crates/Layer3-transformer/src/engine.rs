//! Transformation engine
//!
//! ```text
//! Idle → CacheLookup ─ hit ──────────────────────────────► Done
//!                    └ miss → before_transform → Invoking
//!                                 ├ ok  → CacheWrite → after_transform → Done
//!                                 └ err ───────────────────────────────► Done
//! ```
//!
//! Provider failures become failed results; nothing propagates. Only
//! successful results are written to the cache.

use prism_foundation::event::transform;
use prism_foundation::{Content, Context, EventBus, PrismConfig, ProviderType, ResultCache};
use prism_provider::{ClientOptions, Invoker, Message, ProviderRequest, ResponseContent};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::identity;
use crate::options::{Setting, TransformerOptions};
use crate::result::{ResultData, TransformerMetadata, TransformerResult};
use crate::transformer::Transformer;

// ============================================================================
// Engine
// ============================================================================

/// Cache, invoker and config bound together for repeated transformations
#[derive(Clone)]
pub struct TransformationEngine {
    cache: ResultCache,
    invoker: Arc<dyn Invoker>,
    config: Arc<PrismConfig>,
    events: Option<Arc<EventBus>>,
}

impl TransformationEngine {
    pub fn new(config: Arc<PrismConfig>, cache: ResultCache, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            cache,
            invoker,
            config,
            events: None,
        }
    }

    /// Publish `transform.completed` / `transform.failed`
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn execute(
        &self,
        transformer: &dyn Transformer,
        content: &Content,
        context: &Context,
    ) -> TransformerResult {
        let start = Instant::now();
        let (result, cache_hit) = run_pipeline(
            transformer,
            content,
            context,
            &self.cache,
            self.invoker.as_ref(),
            &self.config,
        )
        .await;

        if let Some(events) = &self.events {
            let event = if result.is_successful() {
                transform::completed(
                    transformer.name(),
                    cache_hit,
                    start.elapsed().as_millis() as u64,
                )
            } else {
                transform::failed(transformer.name(), result.errors())
            };
            events.publish(event).await;
        }

        result
    }
}

/// Run one transformation: cache lookup, provider call, cache write
pub async fn execute_transformation(
    transformer: &dyn Transformer,
    content: &Content,
    context: &Context,
    cache: &ResultCache,
    invoker: &dyn Invoker,
    config: &PrismConfig,
) -> TransformerResult {
    run_pipeline(transformer, content, context, cache, invoker, config)
        .await
        .0
}

async fn run_pipeline(
    transformer: &dyn Transformer,
    content: &Content,
    context: &Context,
    cache: &ResultCache,
    invoker: &dyn Invoker,
    config: &PrismConfig,
) -> (TransformerResult, bool) {
    let key = cache.key(&identity::cache_key(transformer, content, config));

    if let Some(cached) = cache.get_json::<TransformerResult>(&key).await {
        debug!(transformer = transformer.name(), "Serving cached transformation");
        return (cached, true);
    }

    let options = transformer.options();
    let provider_setting = options.provider.as_value().map(String::as_str);

    if let Err(e) = transformer.before_transform(content, context).await {
        let provider = provider_setting
            .map_or(Some(config.default_provider), |name| name.parse().ok());
        let metadata = TransformerMetadata::new(
            transformer.name(),
            provider,
            resolve_model(&options.model, provider, config),
        );
        return (TransformerResult::failed(vec![e.to_string()], metadata), false);
    }

    let provider = match resolve_provider(&options.provider, config) {
        Ok(provider) => provider,
        Err(e) => {
            let metadata = TransformerMetadata::new(
                transformer.name(),
                None,
                resolve_model(&options.model, None, config),
            );
            return (TransformerResult::failed(vec![e.to_string()], metadata), false);
        }
    };
    let model = resolve_model(&options.model, Some(provider), config);
    let metadata = TransformerMetadata::new(transformer.name(), Some(provider), model.clone());

    let request = build_request(transformer, &options, content, provider, model, config);
    info!(
        transformer = transformer.name(),
        provider = %provider,
        model = %request.model,
        "Invoking provider"
    );

    let response = match invoker.invoke(request).await {
        Ok(response) => response,
        Err(e) => return (TransformerResult::failed(vec![e.to_string()], metadata), false),
    };

    let data = match response.content {
        ResponseContent::Text(text) => ResultData::Text(text),
        ResponseContent::Structured(value) => ResultData::Structured(value),
    };
    let result = TransformerResult::successful(data, metadata);

    cache.put_json(&key, &result).await;
    transformer.after_transform(&result).await;

    (result, false)
}

// ============================================================================
// Request construction
// ============================================================================

/// Provider from the transformer's setting, else the config default
pub fn resolve_provider(
    setting: &Setting<String>,
    config: &PrismConfig,
) -> prism_foundation::Result<ProviderType> {
    match setting {
        Setting::Value(name) => name.parse(),
        _ => Ok(config.default_provider),
    }
}

/// Model from the transformer's setting
///
/// Without one, the config default model applies only when the provider is
/// the config default provider; any other provider uses its own default.
pub fn resolve_model(
    setting: &Setting<String>,
    provider: Option<ProviderType>,
    config: &PrismConfig,
) -> String {
    match (setting, provider) {
        (Setting::Value(model), _) => model.clone(),
        (_, Some(provider)) if provider != config.default_provider => {
            provider.default_model().to_string()
        }
        _ => config.default_model.clone(),
    }
}

/// Client options from timeout settings in seconds
///
/// Zero or negative values are dropped; `None` when neither survives.
pub fn resolve_client_options(
    timeout: Option<i64>,
    connect_timeout: Option<i64>,
) -> Option<ClientOptions> {
    let positive = |secs: Option<i64>| secs.filter(|s| *s > 0).map(|s| s as u64);
    let options = ClientOptions::new(positive(timeout), positive(connect_timeout));

    if options.is_empty() {
        None
    } else {
        Some(options)
    }
}

fn effective_timeout(setting: &Setting<i64>, fallback: i64) -> Option<i64> {
    match setting {
        Setting::Unset => Some(fallback),
        Setting::Null => None,
        Setting::Value(secs) => Some(*secs),
    }
}

fn build_request(
    transformer: &dyn Transformer,
    options: &TransformerOptions,
    content: &Content,
    provider: ProviderType,
    model: String,
    config: &PrismConfig,
) -> ProviderRequest {
    let mut request = ProviderRequest::new(provider, model);

    if let Setting::Value(system) = &options.system_prompt {
        request = request.with_message(Message::system(system.clone()));
    }
    request = request
        .with_message(Message::system(transformer.prompt()))
        .with_message(user_message(content));

    if let Setting::Value(temperature) = options.temperature {
        request = request.with_temperature(temperature);
    }
    if let Setting::Value(top_p) = options.top_p {
        request = request.with_top_p(top_p);
    }
    if let Setting::Value(tools) = &options.tools {
        if !tools.is_empty() {
            request = request.with_tools(tools.clone());
        }
    }
    if let Setting::Value(output) = &options.output_format {
        request = request.with_output(output.clone());
    }

    let client_options = resolve_client_options(
        effective_timeout(&options.timeout, config.http.timeout),
        effective_timeout(&options.connect_timeout, config.http.connect_timeout),
    );
    if let Some(client_options) = client_options {
        request = request.with_client_options(client_options);
    }

    debug!(
        messages = request.messages.len(),
        tools = request.tools.len(),
        structured = request.output.is_some(),
        "Built provider request"
    );
    request
}

fn user_message(content: &Content) -> Message {
    match content {
        Content::Text(text) => Message::user(text.clone()),
        Content::Url(url) => Message::user(url.clone()),
        Content::Media(media) => Message::user_with_media("", media.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_client_options() {
        assert_eq!(resolve_client_options(None, None), None);
        assert_eq!(resolve_client_options(Some(0), Some(-3)), None);
        assert_eq!(
            resolve_client_options(Some(30), Some(0)),
            Some(ClientOptions::new(Some(30), None))
        );
        assert_eq!(
            resolve_client_options(None, Some(5)),
            Some(ClientOptions::new(None, Some(5)))
        );
    }

    #[test]
    fn test_resolve_provider() {
        let config = PrismConfig::default();

        assert_eq!(
            resolve_provider(&Setting::Unset, &config).unwrap(),
            config.default_provider
        );
        assert_eq!(
            resolve_provider(&Setting::Value("anthropic".into()), &config).unwrap(),
            ProviderType::Anthropic
        );
        assert!(resolve_provider(&Setting::Value("nope".into()), &config).is_err());
    }

    #[test]
    fn test_resolve_model_follows_provider() {
        let config = PrismConfig::default();

        assert_eq!(
            resolve_model(&Setting::Unset, Some(config.default_provider), &config),
            config.default_model
        );
        assert_eq!(
            resolve_model(&Setting::Unset, Some(ProviderType::Anthropic), &config),
            ProviderType::Anthropic.default_model()
        );
        assert_eq!(
            resolve_model(&Setting::Value("custom".into()), None, &config),
            "custom"
        );
    }

    #[test]
    fn test_effective_timeout() {
        assert_eq!(effective_timeout(&Setting::Unset, 180), Some(180));
        assert_eq!(effective_timeout(&Setting::Null, 180), None);
        assert_eq!(effective_timeout(&Setting::Value(5), 180), Some(5));
    }
}
