use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// 프로바이더 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Groq,
    Ollama,
    Gemini,
    Mistral,
    Deepseek,
    Xai,
}

impl ProviderType {
    /// 전체 목록
    pub const ALL: [ProviderType; 8] = [
        Self::Openai,
        Self::Anthropic,
        Self::Groq,
        Self::Ollama,
        Self::Gemini,
        Self::Mistral,
        Self::Deepseek,
        Self::Xai,
    ];

    /// 식별자 (설정 키, 캐시 키에 사용)
    pub fn id(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
            Self::Mistral => "mistral",
            Self::Deepseek => "deepseek",
            Self::Xai => "xai",
        }
    }

    /// 표시 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Openai => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Groq => "Groq",
            Self::Ollama => "Ollama",
            Self::Gemini => "Gemini",
            Self::Mistral => "Mistral",
            Self::Deepseek => "DeepSeek",
            Self::Xai => "xAI",
        }
    }

    /// API Key 필요 여부
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// OpenAI 호환 chat completions 와이어 포맷 사용 여부
    pub fn is_openai_compatible(&self) -> bool {
        matches!(
            self,
            Self::Openai | Self::Groq | Self::Mistral | Self::Deepseek | Self::Xai
        )
    }

    /// API Key 환경변수
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Mistral => Some("MISTRAL_API_KEY"),
            Self::Deepseek => Some("DEEPSEEK_API_KEY"),
            Self::Xai => Some("XAI_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// 기본 Base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Openai => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Ollama => "http://localhost:11434",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Mistral => "https://api.mistral.ai/v1",
            Self::Deepseek => "https://api.deepseek.com/v1",
            Self::Xai => "https://api.x.ai/v1",
        }
    }

    /// 기본 모델
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Openai => "gpt-4o-mini",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Ollama => "llama3",
            Self::Gemini => "gemini-2.0-flash",
            Self::Mistral => "mistral-small-latest",
            Self::Deepseek => "deepseek-chat",
            Self::Xai => "grok-2-latest",
        }
    }

    /// 기본 max_tokens
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Self::Openai => 4096,
            _ => 8192,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::Openai),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            "gemini" | "google" => Ok(Self::Gemini),
            "mistral" => Ok(Self::Mistral),
            "deepseek" => Ok(Self::Deepseek),
            "xai" | "grok" => Ok(Self::Xai),
            other => Err(Error::InvalidProvider(format!(
                "'{}' is not a supported provider",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::Openai);
        assert_eq!("claude".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert_eq!(" grok ".parse::<ProviderType>().unwrap(), ProviderType::Xai);
    }

    #[test]
    fn test_parse_invalid() {
        let err = "watson".parse::<ProviderType>().unwrap_err();
        assert!(matches!(err, Error::InvalidProvider(_)));
    }

    #[test]
    fn test_display_round_trip() {
        for provider in ProviderType::ALL {
            let parsed: ProviderType = provider.to_string().parse().unwrap();
            assert_eq!(parsed, provider);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ProviderType::Deepseek).unwrap();
        assert_eq!(json, "\"deepseek\"");
    }
}
