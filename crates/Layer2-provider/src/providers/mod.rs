//! HTTP provider backends
//!
//! 각 백엔드는 와이어 포맷만 다르고, 클라이언트 구성과 에러 매핑은
//! [`HttpTransport`]를 공유합니다.

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::{ClientOptions, ProviderError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout when neither config nor transformer sets one
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

const USER_AGENT: &str = concat!("prism-provider/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP plumbing for provider backends
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Self::build_client(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)), None)?;
        Ok(Self { client })
    }

    fn build_client(
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<Client, ProviderError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        builder
            .build()
            .map_err(|e| ProviderError::InvalidRequest(format!("HTTP client: {}", e)))
    }

    /// Client honoring per-request timeouts, or the shared one
    pub fn client_for(&self, options: Option<&ClientOptions>) -> Result<Client, ProviderError> {
        match options {
            Some(options) if !options.is_empty() => {
                debug!(
                    timeout = ?options.timeout,
                    connect_timeout = ?options.connect_timeout,
                    "Building per-request HTTP client"
                );
                Self::build_client(
                    options.timeout_duration(),
                    options.connect_timeout_duration(),
                )
            }
            _ => Ok(self.client.clone()),
        }
    }

    /// POST a JSON body and decode a JSON response
    ///
    /// Non-2xx statuses go through `map_error` with the raw body.
    pub async fn post_json<B, R>(
        &self,
        options: Option<&ClientOptions>,
        url: &str,
        headers: &[(&str, String)],
        body: &B,
        map_error: fn(u16, &str) -> ProviderError,
    ) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let client = self.client_for(options)?;

        let mut request = client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `data:` URI for inline media
pub(crate) fn data_uri(mime_type: Option<&str>, base64: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.unwrap_or("application/octet-stream"),
        base64
    )
}
