//! Prism facade
//!
//! [`PrismServices`] wires config, caches, provider invoker, fetcher, router
//! and an in-process queue once; [`Prism`] is the fluent per-call builder.
//!
//! ```ignore
//! let services = PrismServices::from_config(PrismConfig::load()?)?;
//! let result = Prism::new(&services)
//!     .url("https://example.com/post")
//!     .using(TransformerHandler::transformer(summarizer))
//!     .run()
//!     .await?;
//! ```

use prism_foundation::{
    Content, Context, Error, EventBus, Media, PrismConfig, Result, ResultCache, StoreRegistry,
};
use prism_provider::{Gateway, Invoker};
use prism_queue::{LocalQueue, LocalQueueConfig};
use std::sync::Arc;
use tracing::debug;

use crate::engine::TransformationEngine;
use crate::fetch::{ContentFetcher, FetchOptions};
use crate::router::{Dispatch, ExecutionRouter, HandlerRegistry, TransformerHandler};

// ============================================================================
// PrismServices
// ============================================================================

/// Long-lived services shared by every [`Prism`] call
pub struct PrismServices {
    config: Arc<PrismConfig>,
    events: Arc<EventBus>,
    fetcher: ContentFetcher,
    router: ExecutionRouter,
    queue: LocalQueue,
}

impl PrismServices {
    /// Services backed by the provider gateway built from `config.providers`
    pub fn from_config(config: PrismConfig) -> Result<Self> {
        let gateway = Gateway::from_config(&config.providers)?;
        Self::new(config, Arc::new(gateway))
    }

    /// Services over a custom invoker and fresh in-memory stores
    pub fn new(config: PrismConfig, invoker: Arc<dyn Invoker>) -> Result<Self> {
        Self::with_stores(config, invoker, Arc::new(StoreRegistry::in_memory()))
    }

    pub fn with_stores(
        config: PrismConfig,
        invoker: Arc<dyn Invoker>,
        stores: Arc<StoreRegistry>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let events = Arc::new(EventBus::new());

        let results = ResultCache::for_transformations(&config.cache, stores.clone())
            .with_events(events.clone());
        let fetched =
            ResultCache::for_content_fetch(&config.cache, stores).with_events(events.clone());

        let engine =
            TransformationEngine::new(config.clone(), results, invoker).with_events(events.clone());
        let fetcher = ContentFetcher::new(&config, fetched)?;

        let registry = HandlerRegistry::new();
        let router = ExecutionRouter::new(engine, registry);
        let queue = LocalQueue::with_config(
            LocalQueueConfig::default(),
            Arc::new(router.job_runner()),
        )
        .with_events(events.clone());
        let router = router.with_queue(Arc::new(queue.clone()));

        debug!(
            provider = %config.default_provider,
            cache = config.cache.enabled,
            "Prism services ready"
        );

        Ok(Self {
            config,
            events,
            fetcher,
            router,
            queue,
        })
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    pub fn router(&self) -> &ExecutionRouter {
        &self.router
    }

    pub fn queue(&self) -> &LocalQueue {
        &self.queue
    }

    /// Make a handler available to queued runs
    pub fn register(&self, handler: TransformerHandler) -> Option<TransformerHandler> {
        self.router.registry().register(handler)
    }
}

// ============================================================================
// Prism
// ============================================================================

/// One transformation call, built fluently
#[must_use = "a Prism call does nothing until run() is awaited"]
pub struct Prism<'a> {
    services: &'a PrismServices,
    content: Option<Content>,
    handler: Option<TransformerHandler>,
    context: Context,
    fetch_options: FetchOptions,
    queued: bool,
}

impl<'a> Prism<'a> {
    pub fn new(services: &'a PrismServices) -> Self {
        Self {
            services,
            content: None,
            handler: None,
            context: Context::new(),
            fetch_options: FetchOptions::default(),
            queued: false,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(Content::text(text));
        self
    }

    /// Fetched through the content cache before transforming
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.content = Some(Content::url(url));
        self
    }

    pub fn media(mut self, media: Media) -> Self {
        self.content = Some(Content::Media(media));
        self
    }

    pub fn content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn using(mut self, handler: TransformerHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Dispatch through the task queue instead of running inline
    pub fn queued(mut self) -> Self {
        self.queued = true;
        self
    }

    pub async fn run(self) -> Result<Dispatch> {
        let content = self
            .content
            .ok_or_else(|| Error::InvalidInput("no content given".to_string()))?;
        if self.handler.is_none() {
            return Err(Error::InvalidHandler("no handler given".to_string()));
        }

        let content = match content {
            Content::Url(url) => {
                let body = self.services.fetcher.fetch(&url, &self.fetch_options).await?;
                Content::Text(body)
            }
            other => other,
        };

        self.services
            .router
            .run(content, self.handler.as_ref(), self.context, self.queued)
            .await
    }
}
