//! Tool definitions for LLM function calling

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (should be unique)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for parameters
    pub parameters: ToolParameters,
}

/// Parameters schema for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (usually "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Properties (parameter definitions)
    pub properties: Value,

    /// Required parameters
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolDef {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters {
                schema_type: "object".to_string(),
                properties: serde_json::json!({}),
                required: vec![],
            },
        }
    }

    /// Add a typed parameter (`"string"`, `"integer"`, `"boolean"`, ...)
    pub fn with_typed_param(
        self,
        name: impl Into<String>,
        param_type: &str,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let schema = serde_json::json!({
            "type": param_type,
            "description": description.into()
        });
        self.with_param(name, schema, required)
    }

    pub fn with_string_param(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.with_typed_param(name, "string", description, required)
    }

    /// Add a custom parameter with full schema
    pub fn with_param(mut self, name: impl Into<String>, schema: Value, required: bool) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(name.clone(), schema);
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }

    /// JSON Schema of the parameters object
    pub fn parameters_schema(&self) -> Value {
        serde_json::to_value(&self.parameters).unwrap_or(Value::Null)
    }

    /// Full definition as JSON, used for hashing and wire payloads
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters_schema(),
        })
    }
}
