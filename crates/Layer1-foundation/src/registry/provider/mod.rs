//! Provider registry - 프로바이더 종류 및 자격 증명

mod provider;
mod provider_type;

pub use provider::{ProviderConfig, ProviderEntry};
pub use provider_type::ProviderType;
