//! Argument checks and JSON value helpers shared by the client layers.

use serde_json::Value;

use crate::error::{ClientError, Result};

/// Reject an empty or whitespace-only required argument.
///
/// # Errors
///
/// Returns `ClientError::Validation` naming `field`.
pub fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
