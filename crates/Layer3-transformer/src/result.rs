//! Transformation result values
//!
//! A result is either successful (data, no errors) or failed (errors, no
//! data). The fields are private so the two constructors are the only way
//! to build one.

use prism_foundation::ProviderType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNKNOWN_ERROR: &str = "unknown error";

// ============================================================================
// Data
// ============================================================================

/// Payload of a successful transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResultData {
    Text(String),
    Structured(Value),
}

impl ResultData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultData::Text(text) => Some(text),
            ResultData::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            ResultData::Structured(value) => Some(value),
            ResultData::Text(_) => None,
        }
    }

    /// Printable form: text as is, structured data as pretty JSON
    pub fn render(&self) -> String {
        match self {
            ResultData::Text(text) => text.clone(),
            ResultData::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Which transformer and backend produced a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerMetadata {
    pub model: String,

    /// `None` when the configured provider name could not be resolved
    pub provider: Option<ProviderType>,

    /// Transformer name
    pub source: String,
}

impl TransformerMetadata {
    pub fn new(
        source: impl Into<String>,
        provider: Option<ProviderType>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            provider,
            source: source.into(),
        }
    }
}

// ============================================================================
// TransformerResult
// ============================================================================

/// Outcome of one transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerResult {
    data: Option<ResultData>,
    errors: Vec<String>,
    metadata: Option<TransformerMetadata>,
}

impl TransformerResult {
    pub fn successful(
        data: ResultData,
        metadata: impl Into<Option<TransformerMetadata>>,
    ) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            metadata: metadata.into(),
        }
    }

    /// Failed result; an empty error list is recorded as "unknown error"
    pub fn failed(errors: Vec<String>, metadata: impl Into<Option<TransformerMetadata>>) -> Self {
        let errors = if errors.is_empty() {
            vec![UNKNOWN_ERROR.to_string()]
        } else {
            errors
        };

        Self {
            data: None,
            errors,
            metadata: metadata.into(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn data(&self) -> Option<&ResultData> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<ResultData> {
        self.data
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn metadata(&self) -> Option<&TransformerMetadata> {
        self.metadata.as_ref()
    }

    /// Text payload, if this is a successful text result
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(ResultData::as_text)
    }

    pub fn structured(&self) -> Option<&Value> {
        self.data.as_ref().and_then(ResultData::as_structured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TransformerMetadata {
        TransformerMetadata::new("summarize", Some(ProviderType::Openai), "gpt-4o-mini")
    }

    #[test]
    fn test_successful_has_no_errors() {
        let result = TransformerResult::successful(ResultData::Text("hi".into()), metadata());

        assert!(result.is_successful());
        assert_eq!(result.text(), Some("hi"));
        assert!(result.errors().is_empty());
        assert_eq!(result.metadata().map(|m| m.source.as_str()), Some("summarize"));
    }

    #[test]
    fn test_failed_never_has_empty_errors() {
        let result = TransformerResult::failed(vec![], None);

        assert!(!result.is_successful());
        assert_eq!(result.errors(), ["unknown error".to_string()]);
        assert!(result.data().is_none());
    }

    #[test]
    fn test_serde_preserves_structured_data() {
        let result = TransformerResult::successful(
            ResultData::Structured(serde_json::json!({"score": 3})),
            metadata(),
        );

        let json = serde_json::to_string(&result).unwrap();
        let restored: TransformerResult = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, result);
        assert_eq!(restored.structured().unwrap()["score"], 3);
    }

    #[test]
    fn test_render_structured_as_json() {
        let data = ResultData::Structured(serde_json::json!({"a": 1}));
        assert!(data.render().contains("\"a\": 1"));
        assert_eq!(ResultData::Text("plain".into()).render(), "plain");
    }
}
