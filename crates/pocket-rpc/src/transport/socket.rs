//! Persistent WebSocket transport.
//!
//! One connection per client, opened on first use. Each exchange sends one
//! text frame and drains incoming frames until the response carrying the
//! request's id arrives. Any failure poisons the connection; the next
//! exchange opens a fresh one.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use super::API_KEY_HEADER;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ClientError, Result};
use crate::protocol::{Request, RequestId, envelope_id};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bound on the best-effort close handshake when tearing a connection down
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle of the single socket connection
#[derive(Default)]
enum SocketState {
    /// Never opened, or released by the caller
    #[default]
    Absent,
    Live(Box<WsStream>),
    /// Torn down after a failure; reopened on next use
    Poisoned,
}

impl std::fmt::Debug for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketState::Absent => f.write_str("Absent"),
            SocketState::Live(_) => f.write_str("Live"),
            SocketState::Poisoned => f.write_str("Poisoned"),
        }
    }
}

#[derive(Debug)]
pub struct SocketTransport {
    url: String,
    api_key: Option<HeaderValue>,
    timeout: Duration,
    state: SocketState,
}

impl SocketTransport {
    /// Create an unopened transport for a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the API key is not a valid header value.
    pub fn new(endpoint: &Endpoint, config: &ClientConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .map(|key| {
                HeaderValue::from_str(key).map(|mut value| {
                    value.set_sensitive(true);
                    value
                })
            })
            .transpose()
            .map_err(|_| {
                ClientError::validation("api_key contains characters not allowed in a header")
            })?;

        Ok(Self {
            url: endpoint.socket_url(),
            api_key,
            timeout: config.timeout(),
            state: SocketState::Absent,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SocketState::Live(_))
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        matches!(self.state, SocketState::Poisoned)
    }

    /// Send an envelope and wait for the response with the same id.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the socket cannot be opened, or if
    /// sending, receiving or decoding fails (the connection is then discarded).
    pub async fn exchange(&mut self, request: &Request) -> Result<Map<String, Value>> {
        let payload = serde_json::to_string(request)?;

        let mut stream = match std::mem::take(&mut self.state) {
            SocketState::Live(stream) => stream,
            SocketState::Poisoned => {
                debug!("Reopening socket {} after failure", self.url);
                Box::new(self.open().await?)
            }
            SocketState::Absent => Box::new(self.open().await?),
        };

        match roundtrip(&mut stream, payload, request.id, self.timeout).await {
            Ok(envelope) => {
                self.state = SocketState::Live(stream);
                Ok(envelope)
            }
            Err(reason) => {
                warn!("Socket {} failed, discarding connection: {reason}", self.url);
                close_quietly(&mut stream).await;
                self.state = SocketState::Poisoned;
                Err(ClientError::connection(format!(
                    "WebSocket communication failed: {reason}"
                )))
            }
        }
    }

    /// Close the connection if one is open.
    pub async fn release(&mut self) {
        if let SocketState::Live(mut stream) = std::mem::take(&mut self.state) {
            close_quietly(&mut stream).await;
            debug!("Socket {} closed", self.url);
        }
    }

    async fn open(&self) -> Result<WsStream> {
        let mut request = self.url.as_str().into_client_request().map_err(|e| {
            ClientError::connection(format!("WebSocket connection failed: {e}"))
        })?;
        if let Some(key) = &self.api_key {
            request.headers_mut().insert(API_KEY_HEADER, key.clone());
        }

        let (stream, _response) = tokio::time::timeout(self.timeout, connect_async(request))
            .await
            .map_err(|_| {
                ClientError::connection(format!(
                    "WebSocket connection failed: no handshake within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ClientError::connection(format!("WebSocket connection failed: {e}")))?;

        debug!("Socket {} opened", self.url);
        Ok(stream)
    }
}

/// Best-effort close handshake bounded by [`CLOSE_TIMEOUT`]
async fn close_quietly(stream: &mut WsStream) {
    let _ = tokio::time::timeout(CLOSE_TIMEOUT, stream.close(None)).await;
}

/// Send one envelope and read frames until the correlated response arrives.
async fn roundtrip(
    stream: &mut WsStream,
    payload: String,
    id: RequestId,
    timeout: Duration,
) -> std::result::Result<Map<String, Value>, String> {
    stream
        .send(Message::Text(payload))
        .await
        .map_err(|e| format!("send failed: {e}"))?;

    loop {
        let frame = tokio::time::timeout(timeout, stream.next())
            .await
            .map_err(|_| format!("no response within {}s", timeout.as_secs()))?;

        let text = match frame {
            None | Some(Ok(Message::Close(_))) => {
                return Err("connection closed by server".to_string());
            }
            Some(Err(e)) => return Err(format!("receive failed: {e}")),
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => {
                String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8 frame: {e}"))?
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
        };

        let envelope = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => return Err("expected a JSON object message".to_string()),
            Err(e) => return Err(format!("invalid JSON message: {e}")),
        };

        if envelope_id(&envelope) == Some(id) {
            return Ok(envelope);
        }

        debug!("Discarding socket message not correlated with request {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unopened() {
        let config = ClientConfig::new("ws://127.0.0.1:9/");
        let endpoint = config.validate().unwrap();
        let transport = SocketTransport::new(&endpoint, &config).unwrap();

        assert_eq!(transport.url(), "ws://127.0.0.1:9/ws");
        assert!(!transport.is_open());
        assert!(!transport.is_poisoned());
    }

    #[test]
    fn test_new_rejects_invalid_api_key() {
        let config = ClientConfig::new("ws://127.0.0.1:9").with_api_key("line\rbreak");
        let endpoint = config.validate().unwrap();
        assert!(matches!(
            SocketTransport::new(&endpoint, &config),
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_open_failure_leaves_transport_unopened() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new(format!("ws://127.0.0.1:{port}")).with_timeout_secs(2);
        let endpoint = config.validate().unwrap();
        let mut transport = SocketTransport::new(&endpoint, &config).unwrap();

        let err = transport
            .exchange(&Request::new(1, "tools/list", None))
            .await
            .unwrap_err();
        assert!(err.is_connection());
        assert!(!transport.is_open());
    }
}
