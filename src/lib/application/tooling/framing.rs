//! Newline-delimited JSON-RPC framing for the tool server's stdio.

use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Splits a byte stream into complete lines, holding the trailing partial
/// line until the next chunk arrives.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// Append `chunk` and return every line it completed, trimmed, blanks dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        lines
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Flush whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&raw);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct OutboundRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> OutboundRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// One JSON object, newline-terminated.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: Option<i64>,
    pub message: String,
}

impl RpcError {
    fn from_value(value: &Value) -> Self {
        let code = value.get("code").and_then(Value::as_i64);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .or_else(|| value.as_str().map(str::to_string))
            .unwrap_or_else(|| value.to_string());
        Self { code, message }
    }
}

/// One parsed line from the tool server.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response {
        id: u64,
        outcome: Result<Value, RpcError>,
    },
    /// Server-initiated request; this client never answers them.
    Request { id: Value, method: String },
    Notification { method: String },
    Unrecognised(Value),
}

impl Inbound {
    /// `None` when the line is not JSON; such lines are diagnostic text.
    pub fn parse(line: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(line).ok()?;
        Some(Self::classify(value))
    }

    pub fn classify(value: Value) -> Self {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);
        let id = value.get("id").filter(|id| !id.is_null()).cloned();

        match (method, id) {
            (Some(method), Some(id)) => Inbound::Request { id, method },
            (Some(method), None) => Inbound::Notification { method },
            (None, Some(id)) => match id.as_u64() {
                Some(id) => {
                    let outcome = match value.get("error").filter(|error| !error.is_null()) {
                        Some(error) => Err(RpcError::from_value(error)),
                        None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
                    };
                    Inbound::Response { id, outcome }
                }
                None => Inbound::Unrecognised(value),
            },
            (None, None) => Inbound::Unrecognised(value),
        }
    }
}

/// Stderr signatures that mean the server will never finish starting.
pub fn is_fatal_diagnostic(line: &str) -> bool {
    line.contains("Fatal error") || line.contains("ZodError")
}
