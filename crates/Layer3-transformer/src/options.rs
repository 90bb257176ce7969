//! Transformer options
//!
//! Every option is a [`Setting`]: left unset, explicitly null, or a value.
//! The three states hash differently, so a transformer that says
//! "no temperature" never shares a cache entry with one that says nothing.

use prism_provider::{OutputFormat, ToolDef};
use serde::{Deserialize, Serialize};

// ============================================================================
// Setting
// ============================================================================

/// Tri-state option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Setting<T> {
    /// Not configured; the engine falls back to config defaults
    Unset,
    /// Explicitly disabled
    Null,
    Value(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Unset
    }
}

impl<T> Setting<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Setting::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Setting::Null)
    }

    /// The value, if there is one
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Setting::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Setting<&T> {
        match self {
            Setting::Unset => Setting::Unset,
            Setting::Null => Setting::Null,
            Setting::Value(value) => Setting::Value(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Setting<U> {
        match self {
            Setting::Unset => Setting::Unset,
            Setting::Null => Setting::Null,
            Setting::Value(value) => Setting::Value(f(value)),
        }
    }
}

// ============================================================================
// TransformerOptions
// ============================================================================

/// Request-shaping options of a transformer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformerOptions {
    pub system_prompt: Setting<String>,
    pub temperature: Setting<f32>,
    pub top_p: Setting<f32>,
    pub tools: Setting<Vec<ToolDef>>,

    /// Request timeout in seconds; zero or negative means none
    pub timeout: Setting<i64>,

    /// Connect timeout in seconds; zero or negative means none
    pub connect_timeout: Setting<i64>,

    pub output_format: Setting<OutputFormat>,

    /// Provider name, parsed when the transformation runs
    pub provider: Setting<String>,
    pub model: Setting<String>,
}

impl TransformerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Setting::Value(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Setting::Value(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Setting::Value(top_p);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDef>) -> Self {
        self.tools = Setting::Value(tools);
        self
    }

    pub fn with_timeout(mut self, secs: i64) -> Self {
        self.timeout = Setting::Value(secs);
        self
    }

    pub fn with_connect_timeout(mut self, secs: i64) -> Self {
        self.connect_timeout = Setting::Value(secs);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Setting::Value(format);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Setting::Value(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Setting::Value(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_unset() {
        let options = TransformerOptions::new();
        assert!(options.temperature.is_unset());
        assert!(options.system_prompt.is_unset());
        assert!(options.output_format.is_unset());
    }

    #[test]
    fn test_setting_accessors() {
        let null: Setting<f32> = Setting::Null;
        assert!(null.is_null());
        assert_eq!(null.as_value(), None);

        let value = Setting::Value(0.5f32);
        assert_eq!(value.as_value(), Some(&0.5));
        assert_eq!(value.map(|v| v * 2.0), Setting::Value(1.0));
    }

    #[test]
    fn test_builder_sets_values() {
        let options = TransformerOptions::new()
            .with_provider("anthropic")
            .with_timeout(30);

        assert_eq!(options.provider.as_value().map(String::as_str), Some("anthropic"));
        assert_eq!(options.timeout, Setting::Value(30));
    }
}
