//! RPC transports.
//!
//! Two variants exist and the base address scheme picks one:
//!
//! - [`HttpTransport`]: `POST <base>/mcp` per envelope, retried on transient failures
//! - [`SocketTransport`]: one persistent WebSocket to `<base>/ws`, correlated by id
//!
//! Both hand back the raw response envelope; inspecting it is the dispatcher's job.

mod http;
mod retry;
mod socket;

pub use http::{HEALTH_TIMEOUT_MAX, HttpTransport};
pub use retry::{BACKOFF_MAX, RETRY_STATUSES, RetryPolicy};
pub use socket::SocketTransport;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::protocol::Request;

/// Header carrying the API key on HTTP requests and the socket handshake
pub const API_KEY_HEADER: &str = "x-api-key";

/// The transport a client dispatches through
#[derive(Debug)]
pub enum Transport {
    Http(HttpTransport),
    Socket(SocketTransport),
}

impl Transport {
    /// Select the transport for an endpoint; `http` is reused for HTTP endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the socket transport rejects the config.
    pub fn for_endpoint(
        endpoint: &Endpoint,
        config: &ClientConfig,
        http: &HttpTransport,
    ) -> Result<Self> {
        if endpoint.is_socket() {
            Ok(Self::Socket(SocketTransport::new(endpoint, config)?))
        } else {
            Ok(Self::Http(http.clone()))
        }
    }

    /// Send an envelope and return the correlated response envelope.
    ///
    /// # Errors
    ///
    /// Propagates the active transport's connection or protocol errors.
    pub async fn exchange(&mut self, request: &Request) -> Result<Map<String, Value>> {
        match self {
            Self::Http(http) => http.exchange(request).await,
            Self::Socket(socket) => socket.exchange(request).await,
        }
    }

    /// Release the underlying connection. The HTTP pool is dropped with the client.
    pub async fn release(&mut self) {
        if let Self::Socket(socket) = self {
            socket.release().await;
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Socket(_) => "socket",
        }
    }
}
