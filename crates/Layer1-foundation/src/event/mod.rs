//! Event System - 이벤트 발행/구독 시스템
//!
//! 캐시 에러, 변환 결과, 큐 작업 완료/실패처럼 호출자가 직접 볼 수 없는
//! 결과를 관측하기 위한 통로입니다.
//!
//! ## 사용법
//!
//! ```ignore
//! use prism_foundation::event::{EventBus, types::task};
//!
//! let bus = Arc::new(EventBus::new());
//! let mut rx = bus.receiver();
//!
//! bus.publish(task::failed("3f2a...", "summarize", "provider timeout")).await;
//! let event = rx.recv().await?;
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventBusConfig};

pub use types::{
    // Event constructors
    cache,
    task,
    transform,
    // Core types
    EventCategory,
    EventId,
    EventSeverity,
    PrismEvent,
};
