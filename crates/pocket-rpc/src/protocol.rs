//! JSON-RPC 2.0 protocol types.
//!
//! This module provides the request and response envelopes exchanged with a
//! PocketMCP server, plus the inspection step that turns a response envelope
//! into either its `result` value or a typed error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Fallback message for error members without a usable `message`
pub const UNKNOWN_RPC_ERROR: &str = "Unknown MCP error";

/// Correlation id; unique and strictly increasing per client instance
pub type RequestId = u64;

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 Response
///
/// The client inspects raw envelopes (see [`into_result`]) so that malformed
/// error members can be told apart from well-formed ones; this typed form is
/// what a conforming server produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 Error object returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(code: i64, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Build an `RpcError` from a raw `error` member.
    ///
    /// Returns `None` when the member is not a JSON object. A missing code
    /// becomes `0`, and a missing or empty message becomes [`UNKNOWN_RPC_ERROR`].
    #[must_use]
    pub fn from_member(member: &Value) -> Option<Self> {
        let obj = member.as_object()?;

        let code = obj.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = match obj.get("message") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::String(_) | Value::Null) | None => UNKNOWN_RPC_ERROR.to_string(),
            Some(other) => other.to_string(),
        };
        let data = obj.get("data").filter(|d| !d.is_null()).cloned();

        Some(Self {
            code,
            message,
            data,
        })
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MCP Error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " ({data})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

/// Correlation id of a raw response envelope, if it carries an integer id.
#[must_use]
pub fn envelope_id(envelope: &Map<String, Value>) -> Option<RequestId> {
    envelope.get("id").and_then(Value::as_u64)
}

/// Inspect a response envelope and return its `result` member.
///
/// An `error` member takes precedence over `result`; an absent `result` is
/// returned as `Value::Null`.
///
/// # Errors
///
/// Returns `ClientError::Protocol` if the `error` member is not an object, or
/// `ClientError::Rpc` carrying the server's code, message and data.
pub fn into_result(mut envelope: Map<String, Value>) -> Result<Value> {
    if let Some(member) = envelope.get("error") {
        let error = RpcError::from_member(member)
            .ok_or_else(|| ClientError::Protocol("Invalid JSON-RPC error payload".to_string()))?;
        return Err(ClientError::Rpc(error));
    }

    Ok(envelope.remove("result").unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_request_serialization() {
        let req = Request::new(1, "tools/call", Some(json!({"name": "shell"})));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"tools/call\""));
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"params\":{\"name\":\"shell\"}"));
    }

    #[test]
    fn test_request_without_params() {
        let req = Request::new(7, "tools/list", None);
        let json = serde_json::to_string(&req).unwrap();
        assert!(
            !json.contains("\"params\""),
            "params should be omitted when None"
        );
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_response_success_roundtrip() {
        let resp = Response::success(42, json!({"data": [1, 2, 3]}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("\"error\""));

        let envelope: Map<String, Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope_id(&envelope), Some(42));
        assert_eq!(into_result(envelope).unwrap(), json!({"data": [1, 2, 3]}));
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::error(1, RpcError::new(METHOD_NOT_FOUND, "Method not found"));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("\"result\""));
        assert!(json.contains("-32601"));
    }

    #[test]
    fn test_into_result_passthrough() {
        for result in [json!(null), json!(3), json!("text"), json!([1, {"a": 2}])] {
            let envelope = object(json!({"jsonrpc": "2.0", "id": 1, "result": result.clone()}));
            assert_eq!(into_result(envelope).unwrap(), result);
        }
    }

    #[test]
    fn test_into_result_missing_result_is_null() {
        let envelope = object(json!({"jsonrpc": "2.0", "id": 1}));
        assert_eq!(into_result(envelope).unwrap(), Value::Null);
    }

    #[test]
    fn test_into_result_error_takes_precedence() {
        let envelope = object(json!({
            "id": 3,
            "result": {"ok": true},
            "error": {"code": -32000, "message": "Device locked", "data": {"retry": false}}
        }));

        match into_result(envelope) {
            Err(ClientError::Rpc(err)) => {
                assert_eq!(err.code, -32000);
                assert_eq!(err.message, "Device locked");
                assert_eq!(err.data, Some(json!({"retry": false})));
            }
            other => panic!("Expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn test_into_result_malformed_error_member() {
        for member in [json!("boom"), json!(null), json!([1])] {
            let envelope = object(json!({"id": 1, "error": member}));
            assert!(matches!(into_result(envelope), Err(ClientError::Protocol(_))));
        }
    }

    #[test]
    fn test_rpc_error_from_member_fallbacks() {
        let err = RpcError::from_member(&json!({})).unwrap();
        assert_eq!(err.code, 0);
        assert_eq!(err.message, UNKNOWN_RPC_ERROR);
        assert!(err.data.is_none());

        let err = RpcError::from_member(&json!({"code": 5, "message": "", "data": null})).unwrap();
        assert_eq!(err.message, UNKNOWN_RPC_ERROR);
        assert!(err.data.is_none());

        assert!(RpcError::from_member(&json!("nope")).is_none());
    }

    #[test]
    fn test_rpc_error_display() {
        let err = RpcError::new(INVALID_PARAMS, "missing 'name'");
        assert_eq!(err.to_string(), "MCP Error -32602: missing 'name'");

        let err = RpcError::with_data(INTERNAL_ERROR, "crashed", json!({"tool": "shell"}));
        assert_eq!(
            err.to_string(),
            "MCP Error -32603: crashed ({\"tool\":\"shell\"})"
        );
    }

    #[test]
    fn test_envelope_id_non_integer() {
        assert_eq!(envelope_id(&object(json!({"id": "1"}))), None);
        assert_eq!(envelope_id(&object(json!({"method": "notify"}))), None);
    }
}
