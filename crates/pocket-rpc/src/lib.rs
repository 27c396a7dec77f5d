//! JSON-RPC 2.0 client for PocketMCP device-automation servers.
//!
//! The crate sends correlated request envelopes to a server over either HTTP
//! (`POST <base>/mcp`) or a persistent WebSocket (`<base>/ws`), picked by the
//! scheme of the base address, and decodes tool results into plain JSON.
//!
//! # Architecture
//!
//! - [`endpoint`]: base address normalization and derived URLs
//! - [`config`]: client settings, loadable from a JSON file
//! - [`transport`]: HTTP transport with retries, and the socket transport
//! - [`protocol`]: request/response envelopes and error member inspection
//! - [`client`]: the dispatcher ([`PocketClient`])
//! - [`decode`]: tool result decoding
//! - [`capabilities`]: one wrapper per device tool
//! - [`adapter`]: tool catalogue in agent-framework form
//! - [`error`]: the error taxonomy and `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use pocket_rpc::{ClientConfig, PocketClient};
//!
//! # async fn example() -> pocket_rpc::Result<()> {
//! let config = ClientConfig::new("192.168.1.20:8080").with_api_key("secret");
//! let mut client = PocketClient::new(&config)?;
//!
//! client.initialize().await?;
//! let battery = client.call_tool("device_info", None).await?;
//! println!("{battery}");
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod capabilities;
pub mod client;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod helpers;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod tests;

pub use adapter::ToolAdapter;
pub use client::PocketClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use decode::{UNKNOWN_TOOL_ERROR, decode_tool_result};
pub use endpoint::{Endpoint, Scheme};
pub use error::{ClientError, Result};
pub use protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, JSONRPC_VERSION, METHOD_NOT_FOUND, Request, RequestId,
    Response, RpcError, UNKNOWN_RPC_ERROR,
};
pub use transport::{API_KEY_HEADER, RetryPolicy, Transport};

// Re-export the tool payload types so callers need only this crate
pub use pocket_types::{
    CLIENT_NAME, HttpRequest, InitializeParams, Notifications, PROTOCOL_VERSION, SendMessage,
    SocialMedia, Tap, ToolInfo, ToolSchema, TranscribeAudio, TranscribeWhatsAppAudio, VoiceRecord,
    VolumeControl, WhatsAppAutomation, WhatsAppBusinessMessage,
};
