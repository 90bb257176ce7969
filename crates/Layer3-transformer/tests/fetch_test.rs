//! Content fetch tests against a local HTTP server

use prism_foundation::{Error, PrismConfig, ResultCache, StoreRegistry};
use prism_provider::RetryConfig;
use prism_transformer::{CachePolicy, ContentFetcher, FetchOptions};
use std::error::Error as _;
use std::sync::Arc;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_with(config: &PrismConfig) -> ContentFetcher {
    let cache =
        ResultCache::for_content_fetch(&config.cache, Arc::new(StoreRegistry::in_memory()));
    ContentFetcher::new(config, cache)
        .unwrap()
        .with_retry_config(RetryConfig::immediate(2))
}

fn fetcher() -> ContentFetcher {
    fetcher_with(&PrismConfig::default())
}

#[tokio::test]
async fn test_fetch_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Article body"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let url = format!("{}/article", server.uri());

    assert_eq!(fetcher.fetch(&url, &FetchOptions::new()).await.unwrap(), "Article body");
    assert_eq!(fetcher.fetch(&url, &FetchOptions::new()).await.unwrap(), "Article body");
}

#[tokio::test]
async fn test_blank_bodies_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   \n"))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let url = format!("{}/empty", server.uri());

    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_content_fetch_cache_can_be_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = PrismConfig::default();
    config.cache.content_fetch.enabled = false;
    let fetcher = fetcher_with(&config);
    let url = server.uri();

    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_custom_cache_policy() {
    struct NoErrorPages;

    impl CachePolicy for NoErrorPages {
        fn is_cacheable(&self, body: &str) -> bool {
            !body.contains("maintenance")
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("down for maintenance"))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher().with_policy(Arc::new(NoErrorPages));
    let url = server.uri();

    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
    fetcher.fetch(&url, &FetchOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_method_headers_and_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "secret"))
        .and(body_string(r#"{"q":"prism"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("results"))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetchOptions::new()
        .with_method("post")
        .with_header("x-api-key", "secret")
        .with_body(r#"{"q":"prism"}"#);

    let body = fetcher()
        .fetch(&format!("{}/search", server.uri()), &options)
        .await
        .unwrap();
    assert_eq!(body, "results");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/missing", server.uri()), &FetchOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert!(err.to_string().starts_with("HTTP 404"));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&server.uri(), &FetchOptions::new())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("HTTP 503"));
}

#[tokio::test]
async fn test_network_failure_keeps_cause() {
    // Nothing listens on port 1
    let err = fetcher()
        .with_retry_config(RetryConfig::no_retry())
        .fetch("http://127.0.0.1:1/", &FetchOptions::new())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Network error fetching"));
    assert!(err.source().is_some());
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let err = fetcher()
        .fetch("file:///etc/hosts", &FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Only http/https URLs are allowed, got: file");
}
