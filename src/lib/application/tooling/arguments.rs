//! Typed view over tool-call argument payloads.

use super::catalog::KnownTool;
use super::error::ArgumentError;
use serde_json::{Map, Value};

/// Arguments of one tool call.
///
/// Only `read-items` has a typed shape; every other tool, known or not, is
/// carried as an open JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArguments {
    ReadItems {
        collection: Option<Value>,
        query: Value,
        extra: Map<String, Value>,
    },
    Open(Value),
}

impl ToolArguments {
    /// Decode the raw argument text the model produced for `tool`.
    ///
    /// Blank text is treated as an empty object.
    pub fn parse(tool: &str, raw: &str) -> Result<Self, ArgumentError> {
        let value = if raw.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|source| ArgumentError {
                tool: tool.to_string(),
                source,
            })?
        };
        Ok(Self::from_value(tool, value))
    }

    /// Classify `value`, moving flat `read-items` filters under `query`.
    ///
    /// Models often send `{collection, limit, filter}` for `read-items`
    /// where the server expects `{collection, query: {limit, filter}}`.
    pub fn from_value(tool: &str, value: Value) -> Self {
        match (KnownTool::from_name(tool), value) {
            (Some(KnownTool::ReadItems), Value::Object(mut map)) => {
                let collection = map.remove("collection");
                match map.remove("query").filter(|query| !query.is_null()) {
                    Some(query) => ToolArguments::ReadItems {
                        collection,
                        query,
                        extra: map,
                    },
                    None => ToolArguments::ReadItems {
                        collection,
                        query: Value::Object(map),
                        extra: Map::new(),
                    },
                }
            }
            (_, value) => ToolArguments::Open(value),
        }
    }

    /// The manual fallback's "latest record" read.
    pub fn latest_item(collection: &str) -> Self {
        let mut query = Map::new();
        query.insert("sort".into(), Value::Array(vec![Value::from("-id")]));
        query.insert("limit".into(), Value::from(1));
        ToolArguments::ReadItems {
            collection: Some(Value::from(collection)),
            query: Value::Object(query),
            extra: Map::new(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ToolArguments::ReadItems {
                collection,
                query,
                extra,
            } => {
                let mut map = Map::new();
                if let Some(collection) = collection {
                    map.insert("collection".into(), collection);
                }
                map.insert("query".into(), query);
                map.extend(extra);
                Value::Object(map)
            }
            ToolArguments::Open(value) => value,
        }
    }
}
