//! Error types for Prism
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by fetch errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Prism 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 캐시 관련
    // ========================================================================
    #[error("Cache error: {0}")]
    Cache(String),

    // ========================================================================
    // Provider 관련
    // ========================================================================
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    // ========================================================================
    // Content 관련
    // ========================================================================
    /// URL 가져오기 실패 (메시지로 구분, 원인 보존)
    #[error("{message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Invalid media kind: {0}")]
    InvalidMediaKind(String),

    #[error("Invalid media payload: {0}")]
    InvalidMedia(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Invalid transformer handler: {0}")]
    InvalidHandler(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Transformer error: {0}")]
    Transformer(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Fetch 에러 생성 헬퍼 (원인 없음)
    pub fn fetch(message: impl Into<String>) -> Self {
        Error::Fetch {
            message: message.into(),
            source: None,
        }
    }

    /// Fetch 에러 생성 헬퍼 (원인 보존)
    pub fn fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// 호출자에게 그대로 전달되어야 하는 에러인지 확인
    ///
    /// Fetch, media decode, handler 에러는 복구하지 않는다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. }
                | Error::InvalidMediaKind(_)
                | Error::InvalidMedia(_)
                | Error::InvalidHandler(_)
        )
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
