//! Registry - 프로바이더 등록/관리
//!
//! - `provider/` - LLM Provider 종류와 자격 증명

pub mod provider;

// Provider
pub use provider::{ProviderConfig, ProviderEntry, ProviderType};
