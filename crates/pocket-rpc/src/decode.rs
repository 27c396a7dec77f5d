//! Tool result decoding.
//!
//! Servers wrap tool output in a `content` list of typed parts. Most tools
//! emit a JSON document as a single text part, which is rehydrated here;
//! plain-text output comes back as a string, and anything else passes
//! through untouched.

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::helpers::is_truthy;

/// Message used when a failed tool result carries no usable `toolError`
pub const UNKNOWN_TOOL_ERROR: &str = "Unknown tool error";

/// Unwrap the `result` of a `tools/call` response.
///
/// # Errors
///
/// Returns `ClientError::Tool` if the result has a truthy `isError` flag.
pub fn decode_tool_result(result: Value) -> Result<Value> {
    let Value::Object(obj) = &result else {
        return Ok(result);
    };

    if obj.get("isError").is_some_and(is_truthy) {
        let message = match obj.get("toolError") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(other) if is_truthy(other) => other.to_string(),
            _ => UNKNOWN_TOOL_ERROR.to_string(),
        };
        return Err(ClientError::Tool(message));
    }

    let Some(content) = obj.get("content") else {
        return Ok(result);
    };

    let text = text_parts(content).collect::<Vec<_>>().join("\n");
    if text.is_empty() {
        return Ok(result);
    }

    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Non-empty `text` of every `{"type": "text"}` part.
fn text_parts(content: &Value) -> impl Iterator<Item = &str> {
    content
        .as_array()
        .into_iter()
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
}
