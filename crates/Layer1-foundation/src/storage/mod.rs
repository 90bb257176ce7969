//! Storage module for Prism
//!
//! - `json`: JSON - 범용 파일 저장/로드 (설정 파일)

mod json;

// JSON Storage (범용)
pub use json::{JsonStore, CONFIG_DIR_NAME};
