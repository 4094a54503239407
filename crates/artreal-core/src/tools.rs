//! Tool definition and output types.
//!
//! Definitions are what the completion service sees; outputs are what a tool
//! hands back to the runtime before it is folded into a tool-result turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Tool schema
// ─────────────────────────────────────────────────────────────────────────────

/// JSON Schema-compatible parameter definition for a tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolParameterSchema {
    /// Top-level JSON Schema type.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions.
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
    /// Required property names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolParameterSchema {
    /// An `object` schema from a property map and required names.
    #[must_use]
    pub fn object(properties: serde_json::Map<String, Value>, required: &[&str]) -> Self {
        Self {
            schema_type: "object".into(),
            properties,
            required: required.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// A tool definition offered to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: ToolParameterSchema,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool output
// ─────────────────────────────────────────────────────────────────────────────

/// What a tool returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text shown to the model.
    pub content: String,
    /// Whether the execution failed.
    #[serde(default)]
    pub is_error: bool,
}

/// Create a successful text result.
#[must_use]
pub fn text_result(text: impl Into<String>) -> ToolOutput {
    ToolOutput {
        content: text.into(),
        is_error: false,
    }
}

/// Create an error result.
#[must_use]
pub fn error_result(message: impl Into<String>) -> ToolOutput {
    ToolOutput {
        content: message.into(),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_schema_serializes() {
        let mut props = serde_json::Map::new();
        let _ = props.insert("path".into(), json!({"type": "string"}));
        let schema = ToolParameterSchema::object(props, &["path"]);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["path"]));
    }

    #[test]
    fn result_helpers() {
        assert!(!text_result("ok").is_error);
        let err = error_result("nope");
        assert!(err.is_error);
        assert_eq!(err.content, "nope");
    }
}
