//! Event Types - 시스템 전체에서 사용되는 이벤트 타입 정의

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Category / Severity
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 캐시 저장소 이벤트
    Cache,
    /// 변환 실행 이벤트
    Transform,
    /// 큐 작업 이벤트
    Task,
    /// 사용자 정의 이벤트
    Custom,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Transform => "transform",
            Self::Task => "task",
            Self::Custom => "custom",
        }
    }
}

/// 이벤트 심각도
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

// ============================================================================
// PrismEvent
// ============================================================================

/// Prism 시스템 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrismEvent {
    /// 이벤트 ID
    pub id: EventId,

    /// 이벤트 타입 (예: "task.failed", "cache.error")
    pub event_type: String,

    /// 이벤트 카테고리
    pub category: EventCategory,

    /// 심각도
    pub severity: EventSeverity,

    /// 이벤트 발생 시간
    pub timestamp: DateTime<Utc>,

    /// 이벤트 소스 (모듈)
    pub source: String,

    /// 이벤트 데이터
    pub data: Value,
}

impl PrismEvent {
    pub fn new(event_type: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            category,
            severity: EventSeverity::Info,
            timestamp: Utc::now(),
            source: String::new(),
            data: Value::Null,
        }
    }

    pub fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

// ============================================================================
// 사전 정의된 이벤트 타입들
// ============================================================================

/// 캐시 이벤트
pub mod cache {
    use super::*;

    /// 저장소 에러 (삼켜진 에러 관측용)
    pub fn error(store: &str, operation: &str, key: &str, message: &str) -> PrismEvent {
        PrismEvent::new("cache.error", EventCategory::Cache)
            .with_severity(EventSeverity::Warning)
            .with_source("cache")
            .with_data(serde_json::json!({
                "store": store,
                "operation": operation,
                "key": key,
                "message": message,
            }))
    }
}

/// 변환 이벤트
pub mod transform {
    use super::*;

    pub fn completed(source: &str, cache_hit: bool, duration_ms: u64) -> PrismEvent {
        PrismEvent::new("transform.completed", EventCategory::Transform)
            .with_source("engine")
            .with_data(serde_json::json!({
                "transformer": source,
                "cache_hit": cache_hit,
                "duration_ms": duration_ms,
            }))
    }

    pub fn failed(source: &str, errors: &[String]) -> PrismEvent {
        PrismEvent::new("transform.failed", EventCategory::Transform)
            .with_severity(EventSeverity::Error)
            .with_source("engine")
            .with_data(serde_json::json!({
                "transformer": source,
                "errors": errors,
            }))
    }
}

/// 큐 작업 이벤트
pub mod task {
    use super::*;

    pub fn enqueued(task_id: &str, handler: &str) -> PrismEvent {
        PrismEvent::new("task.enqueued", EventCategory::Task)
            .with_source("queue")
            .with_data(serde_json::json!({
                "task_id": task_id,
                "handler": handler,
            }))
    }

    pub fn completed(task_id: &str, handler: &str, duration_ms: u64) -> PrismEvent {
        PrismEvent::new("task.completed", EventCategory::Task)
            .with_source("queue")
            .with_data(serde_json::json!({
                "task_id": task_id,
                "handler": handler,
                "duration_ms": duration_ms,
            }))
    }

    pub fn failed(task_id: &str, handler: &str, error: &str) -> PrismEvent {
        PrismEvent::new("task.failed", EventCategory::Task)
            .with_severity(EventSeverity::Error)
            .with_source("queue")
            .with_data(serde_json::json!({
                "task_id": task_id,
                "handler": handler,
                "error": error,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn test_task_failed_event() {
        let event = task::failed("abc", "summarize", "boom");

        assert_eq!(event.event_type, "task.failed");
        assert_eq!(event.category, EventCategory::Task);
        assert_eq!(event.severity, EventSeverity::Error);
        assert_eq!(event.data["error"], "boom");
    }

    #[test]
    fn test_cache_error_event() {
        let event = cache::error("redis", "get", "prism_transformer:abc", "refused");
        assert_eq!(event.event_type, "cache.error");
        assert_eq!(event.severity, EventSeverity::Warning);
        assert_eq!(event.category.as_str(), "cache");
    }
}
