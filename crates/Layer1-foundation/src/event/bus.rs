//! Event Bus - 관측용 이벤트 브로드캐스트
//!
//! 발행은 실패하지 않습니다. 수신자가 없으면 브로드캐스트는 버려지고,
//! 최근 이벤트는 히스토리에 남아 나중에 조회할 수 있습니다.

use super::types::{EventSeverity, PrismEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

// ============================================================================
// EventBusConfig
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 브로드캐스트 채널 용량 (느린 수신자는 오래된 이벤트를 놓친다)
    pub channel_capacity: usize,

    /// 이벤트 히스토리 보관 개수
    pub history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_size: 100,
        }
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스
///
/// 큐 작업 실패처럼 호출자에게 보이지 않는 결과를 관측하는 통로.
pub struct EventBus {
    config: EventBusConfig,
    sender: broadcast::Sender<PrismEvent>,
    history: Mutex<VecDeque<PrismEvent>>,
    published: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));

        Self {
            history: Mutex::new(VecDeque::with_capacity(config.history_size)),
            config,
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: PrismEvent) {
        self.published.fetch_add(1, Ordering::SeqCst);
        trace!(event_id = %event.id, event_type = %event.event_type, "Publishing event");

        {
            let mut history = self.history.lock();
            history.push_back(event.clone());
            while history.len() > self.config.history_size {
                history.pop_front();
            }
        }

        // 수신자가 없어도 무시
        let _ = self.sender.send(event);
    }

    /// 브로드캐스트 수신자 (구독 이후 발행된 이벤트만 받는다)
    pub fn receiver(&self) -> broadcast::Receiver<PrismEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 (최신순)
    pub async fn history(&self, limit: Option<usize>) -> Vec<PrismEvent> {
        let history = self.history.lock();
        let limit = limit.unwrap_or(history.len());
        history.iter().rev().take(limit).cloned().collect()
    }

    /// 타입이 일치하는 이벤트 (발행순)
    pub async fn of_type(&self, event_type: &str) -> Vec<PrismEvent> {
        self.history
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Error 심각도 이벤트 (발행순)
    pub async fn failures(&self) -> Vec<PrismEvent> {
        self.history
            .lock()
            .iter()
            .filter(|e| e.severity >= EventSeverity::Error)
            .cloned()
            .collect()
    }

    /// 총 발행된 이벤트 수 (히스토리에서 밀려난 것 포함)
    pub fn event_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("event_count", &self.event_count())
            .finish()
    }
}

// ============================================================================
// 테스트
// ============================================================================
