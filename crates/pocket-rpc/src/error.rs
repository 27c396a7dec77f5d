//! Error types for the pocket-rpc crate.
//!
//! Every failure a caller can observe falls into one of five classes:
//! connection, protocol, RPC, tool, or validation. Only connection failures
//! on the HTTP transport are ever retried, and that happens inside the
//! transport before the error reaches the caller.

use crate::protocol::RpcError;

/// Unified error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure: connect, timeout, exhausted HTTP retries,
    /// socket open/send/receive failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response did not have the expected envelope shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with a well-formed JSON-RPC `error` member.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The tool ran but reported failure through its result.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Caller-supplied arguments failed a precondition; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::METHOD_NOT_FOUND;

    #[test]
    fn test_error_from_rpc_error() {
        let rpc_err = RpcError::new(METHOD_NOT_FOUND, "Method not found");
        let err: ClientError = rpc_err.into();

        match err {
            ClientError::Rpc(inner) => {
                assert_eq!(inner.code, -32601);
                assert!(inner.message.contains("not found"));
            }
            _ => panic!("Expected Rpc error"),
        }
    }

    #[test]
    fn test_rpc_error_display_is_transparent() {
        let err: ClientError = RpcError::new(-32000, "Device locked").into();
        assert_eq!(err.to_string(), "MCP Error -32000: Device locked");
    }

    #[test]
    fn test_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ClientError = json_err.into();

        assert!(matches!(err, ClientError::Json(_)));
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::connection("Request failed: connection refused");
        assert_eq!(
            err.to_string(),
            "Connection error: Request failed: connection refused"
        );

        let err = ClientError::protocol("Invalid JSON-RPC error payload");
        assert_eq!(
            err.to_string(),
            "Protocol error: Invalid JSON-RPC error payload"
        );

        let err = ClientError::Tool("boom".to_string());
        assert_eq!(err.to_string(), "Tool error: boom");

        let err = ClientError::validation("query is required");
        assert_eq!(err.to_string(), "Validation error: query is required");
    }

    #[test]
    fn test_is_connection() {
        assert!(ClientError::connection("x").is_connection());
        assert!(!ClientError::protocol("x").is_connection());
        assert!(!ClientError::Tool("x".to_string()).is_connection());
    }

    #[test]
    fn test_error_debug_format() {
        let err = ClientError::Tool("test error".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Tool"));
        assert!(debug_str.contains("test error"));
    }
}
