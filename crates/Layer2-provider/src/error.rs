//! Provider-specific error types
//!
//! ProviderError는 LLM 제공자 호출 관련 세부 에러를 관리합니다.
//! prism_foundation::Error와의 변환을 지원합니다.

use crate::retry::{RetryClassification, RetryableError};
use prism_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur during provider invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Provider name could not be resolved
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    /// Provider selected but not configured (missing key/endpoint)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Context length exceeded
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Client-side timeout (request or connect)
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network error (connection failed, DNS, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found or not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl RetryableError for ProviderError {
    fn classify(&self) -> RetryClassification {
        match self {
            ProviderError::RateLimited { retry_after_ms } => RetryClassification::RateLimited {
                retry_after_ms: *retry_after_ms,
            },

            ProviderError::ServerError(_) | ProviderError::Network(_) => {
                RetryClassification::Retry
            }

            // A timeout already spent the caller's budget
            ProviderError::Timeout(_)
            | ProviderError::InvalidProvider(_)
            | ProviderError::NotConfigured(_)
            | ProviderError::Authentication(_)
            | ProviderError::ContextLengthExceeded(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::ModelNotAvailable(_)
            | ProviderError::Unknown(_) => RetryClassification::NoRetry,
        }
    }
}

impl ProviderError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => ProviderError::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },
            400 | 413 => {
                if body.contains("context") || body.contains("too long") {
                    ProviderError::ContextLengthExceeded(body.to_string())
                } else {
                    ProviderError::InvalidRequest(body.to_string())
                }
            }
            404 => ProviderError::ModelNotAvailable(body.to_string()),
            408 => ProviderError::Timeout(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            ProviderError::InvalidRequest(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self.classify(), RetryClassification::NoRetry)
    }
}

/// Try to extract retry-after value from error body (in milliseconds)
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    json.get("error")
        .and_then(|e| e.get("retry_after"))
        .or_else(|| json.get("retry_after"))
        .and_then(|v| v.as_f64())
        .map(|secs| (secs * 1000.0) as u64)
}

// ============================================================================
// prism_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidProvider(msg) => FoundationError::InvalidProvider(msg),
            ProviderError::NotConfigured(msg) => FoundationError::Config(msg),
            ProviderError::Timeout(msg) => FoundationError::Timeout(msg),
            ProviderError::InvalidRequest(msg) => FoundationError::InvalidInput(msg),
            other => FoundationError::Provider(other.to_string()),
        }
    }
}

impl From<FoundationError> for ProviderError {
    fn from(err: FoundationError) -> Self {
        match err {
            FoundationError::InvalidProvider(msg) => ProviderError::InvalidProvider(msg),
            FoundationError::Config(msg) => ProviderError::NotConfigured(msg),
            FoundationError::Timeout(msg) => ProviderError::Timeout(msg),
            other => ProviderError::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            ProviderError::from_http_status(401, "bad key"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "overloaded"),
            ProviderError::ServerError(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(400, "maximum context length"),
            ProviderError::ContextLengthExceeded(_)
        ));
    }

    #[test]
    fn test_rate_limit_retry_after() {
        let err = ProviderError::from_http_status(429, r#"{"error": {"retry_after": 1.5}}"#);
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after_ms: Some(1500)
            }
        );
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Rate limit exceeded, retry after 1500ms");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(!ProviderError::Timeout("30s".into()).is_retryable());
        assert!(!ProviderError::InvalidProvider("x".into()).is_retryable());
    }

    #[test]
    fn test_foundation_conversion() {
        let err: FoundationError = ProviderError::InvalidProvider("watson".into()).into();
        assert!(matches!(err, FoundationError::InvalidProvider(_)));

        let back: ProviderError = FoundationError::InvalidProvider("watson".into()).into();
        assert_eq!(back, ProviderError::InvalidProvider("watson".into()));
    }
}
