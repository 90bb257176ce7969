//! Content acquisition - fetch remote content with its own cache namespace
//!
//! Every failure surfaces as `Error::Fetch`, told apart by message, with the
//! underlying cause kept as the error source. The cache key depends only on
//! the request, never on a transformer.

use prism_foundation::{
    CacheConfig, Error, Fingerprint, PrismConfig, Result, ResultCache, StoreRegistry,
    CONTENT_FETCH_TAG,
};
use prism_provider::{with_retry, RetryClassification, RetryConfig, RetryableError};
use reqwest::{redirect::Policy, Client, Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// User agent sent with every fetch
pub const USER_AGENT: &str = concat!("prism-transformer/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 10;

// ============================================================================
// Options / Policy
// ============================================================================

/// Request shape for a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Decides whether a fetched body is worth caching
pub trait CachePolicy: Send + Sync {
    fn is_cacheable(&self, body: &str) -> bool {
        !body.trim().is_empty()
    }
}

/// Caches any body that is not blank
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCachePolicy;

impl CachePolicy for DefaultCachePolicy {}

// ============================================================================
// ContentFetcher
// ============================================================================

/// HTTP fetcher backed by the content fetch cache
#[derive(Clone)]
pub struct ContentFetcher {
    client: Client,
    cache: ResultCache,
    policy: Arc<dyn CachePolicy>,
    retry: RetryConfig,
}

impl ContentFetcher {
    /// Fetcher with the config's HTTP timeouts and the given cache
    pub fn new(config: &PrismConfig, cache: ResultCache) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS));

        if config.http.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(config.http.timeout as u64));
        }
        if config.http.connect_timeout > 0 {
            builder =
                builder.connect_timeout(Duration::from_secs(config.http.connect_timeout as u64));
        }

        let client = builder
            .build()
            .map_err(|e| Error::fetch_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            cache,
            policy: Arc::new(DefaultCachePolicy),
            retry: RetryConfig {
                max_retries: 2,
                ..RetryConfig::default()
            },
        })
    }

    /// Fetcher using the content fetch namespace of `config.cache`
    pub fn from_config(config: &PrismConfig, stores: Arc<StoreRegistry>) -> Result<Self> {
        Self::new(config, ResultCache::for_content_fetch(&config.cache, stores))
    }

    pub fn with_policy(mut self, policy: Arc<dyn CachePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Content fetch hash of a request (without namespace prefix)
    pub fn cache_key(url: &str, options: &FetchOptions) -> String {
        let headers: serde_json::Map<String, Value> = options
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        let mut fp = Fingerprint::new(CONTENT_FETCH_TAG);
        fp.push_str("url", url)
            .push_str("method", &options.method.to_ascii_uppercase())
            .push_json("headers", &Value::Object(headers))
            .push_opt_str("body", options.body.as_deref());
        fp.finalize()
    }

    /// Fetch `url` as text, serving from cache when possible
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::fetch_with_source(format!("Invalid URL: {}", url), e))?;

        let scheme = parsed.scheme();
        if !["http", "https"].contains(&scheme) {
            return Err(Error::fetch(format!(
                "Only http/https URLs are allowed, got: {}",
                scheme
            )));
        }

        let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| {
                Error::fetch_with_source(format!("Invalid HTTP method: {}", options.method), e)
            })?;

        let key = self.cache.key(&Self::cache_key(url, options));
        if let Some(bytes) = self.cache.get(&key).await {
            match String::from_utf8(bytes) {
                Ok(body) => return Ok(body),
                Err(_) => debug!(key, "Ignoring non-UTF-8 cached body"),
            }
        }

        info!("Fetching URL: {}", url);
        let body = with_retry(&self.retry, "content_fetch", || {
            self.send_once(method.clone(), &parsed, options)
        })
        .await
        .map_err(|e| e.into_error(url))?;

        if self.policy.is_cacheable(&body) {
            self.cache.put(&key, body.clone().into_bytes()).await;
        } else {
            debug!(url, "Fetched body not cacheable");
        }

        Ok(body)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &url::Url,
        options: &FetchOptions,
    ) -> std::result::Result<String, FetchFailure> {
        let mut request = self.client.request(method, url.clone());
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(FetchFailure::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status));
        }

        response.text().await.map_err(FetchFailure::Decode)
    }

    /// Fetcher over a fresh in-memory cache, for tools and tests
    pub fn in_memory(config: &PrismConfig) -> Result<Self> {
        let cache = ResultCache::for_content_fetch(
            &CacheConfig::default(),
            Arc::new(StoreRegistry::in_memory()),
        );
        Self::new(config, cache)
    }
}

// ============================================================================
// Failure classification
// ============================================================================

#[derive(Debug)]
enum FetchFailure {
    Status(StatusCode),
    Network(reqwest::Error),
    Decode(reqwest::Error),
}

impl FetchFailure {
    fn into_error(self, url: &str) -> Error {
        match self {
            FetchFailure::Status(status) => {
                Error::fetch(format!("HTTP {} fetching {}", status.as_u16(), url))
            }
            FetchFailure::Network(e) => {
                Error::fetch_with_source(format!("Network error fetching {}", url), e)
            }
            FetchFailure::Decode(e) => {
                Error::fetch_with_source(format!("Failed to decode response from {}", url), e)
            }
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "HTTP {}", status),
            FetchFailure::Network(e) => write!(f, "network: {}", e),
            FetchFailure::Decode(e) => write!(f, "decode: {}", e),
        }
    }
}

impl RetryableError for FetchFailure {
    fn classify(&self) -> RetryClassification {
        match self {
            FetchFailure::Status(status)
                if status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS =>
            {
                RetryClassification::Retry
            }
            FetchFailure::Network(e) if !e.is_builder() => RetryClassification::Retry,
            _ => RetryClassification::NoRetry,
        }
    }
}
