//! Uniform success/error shape for `tools/call` results.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static DATA_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<data>(.*?)</data>").expect("valid data marker pattern"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            extracted_id: None,
            message: None,
        }
    }

    pub fn failed(error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details,
            extracted_id: None,
            message: None,
        }
    }

    /// Record identifier rendered for conversational reuse.
    pub fn extracted_id_text(&self) -> Option<String> {
        self.extracted_id.as_ref().map(display_id)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn display_id(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Never fails: anything unrecognised is passed through as successful data.
pub fn normalize(raw: &Value) -> ToolResult {
    if raw.get("isError").and_then(Value::as_bool) == Some(true) {
        return ToolResult::failed("Tool failed", raw.get("content").cloned());
    }

    let text = raw
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        })
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str);

    if let Some(text) = text {
        if let Some(captures) = DATA_MARKER.captures(text) {
            let payload = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            return match serde_json::from_str::<Value>(payload) {
                Ok(data) => with_extracted_id(data),
                Err(_) => ToolResult::ok(Value::String(text.to_string())),
            };
        }
    }

    ToolResult::ok(raw.clone())
}

fn with_extracted_id(data: Value) -> ToolResult {
    let first = match data.as_array().and_then(|records| records.first()) {
        Some(first) => first,
        None => return ToolResult::ok(data),
    };

    let extracted_id = ["id", "ID"]
        .iter()
        .filter_map(|key| first.get(*key))
        .find(|value| is_usable_id(value))
        .cloned();
    let message = match &extracted_id {
        Some(id) => format!("ID: {} extracted", display_id(id)),
        None => "Data retrieved".to_string(),
    };

    ToolResult {
        extracted_id,
        message: Some(message),
        ..ToolResult::ok(data)
    }
}

fn is_usable_id(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64() != Some(0.0),
        _ => true,
    }
}
