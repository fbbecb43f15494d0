//! Success envelope returned by tools.

use hitl_client::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Result, ToolError};

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Plain text; tool payloads are JSON serialized into it.
    Text { text: String },
}

/// `{content: [{type: "text", text}]}`.
///
/// Successful results are always a single text block holding JSON, whatever
/// the shape of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<Content>,
}

impl ToolOutput {
    /// Serialize `payload` into a single text block.
    pub fn json(payload: &Value) -> Result<Self> {
        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| ToolError::Internal(format!("failed to serialize result: {e}")))?;
        Ok(Self {
            content: vec![Content::Text { text }],
        })
    }

    /// Text of the first block.
    pub fn text(&self) -> Option<&str> {
        self.content.first().map(|Content::Text { text }| text.as_str())
    }

    /// Parse the first block back into JSON.
    pub fn payload(&self) -> Option<Value> {
        self.text().and_then(|t| serde_json::from_str(t).ok())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result shaping
// ─────────────────────────────────────────────────────────────────────────────

fn unexpected_shape(what: &str) -> ToolError {
    ToolError::Upstream {
        status: 502,
        message: format!("Unexpected response from HITL API: missing {what}"),
    }
}

/// Pull a named array out of the response data.
///
/// Accepts either a bare array or an object holding the array under `key`.
fn collection<'a>(data: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| unexpected_shape(key)),
        _ => Err(unexpected_shape(key)),
    }
}

/// `{loops, count}`.
pub fn loops_payload(response: &ApiResponse) -> Result<Value> {
    let data = response.data_or_null();
    let loops = collection(&data, "loops")?;
    Ok(json!({
        "loops": loops,
        "count": loops.len(),
    }))
}

/// `{requests, count, pagination?}`.
pub fn requests_payload(response: &ApiResponse) -> Result<Value> {
    let data = response.data_or_null();
    let requests = collection(&data, "requests")?;
    let mut payload = json!({
        "requests": requests,
        "count": requests.len(),
    });
    if let Some(pagination) = data.get("pagination").filter(|p| !p.is_null()) {
        payload["pagination"] = pagination.clone();
    }
    Ok(payload)
}

/// Upstream data with the API's `msg` under `message`.
pub fn data_payload(response: &ApiResponse) -> Value {
    let message = Value::String(response.msg.clone());
    match response.data_or_null() {
        Value::Object(mut map) => {
            map.insert("message".to_string(), message);
            Value::Object(map)
        }
        Value::Null => {
            let mut map = Map::new();
            map.insert("message".to_string(), message);
            Value::Object(map)
        }
        other => json!({ "data": other, "message": message }),
    }
}
