//! RPC dispatcher for a PocketMCP server.
//!
//! [`PocketClient`] owns the request-id counter and the active transport.
//! Every dispatch takes `&mut self`, so one client serves one logical caller
//! and never has more than one exchange outstanding.

use std::time::Duration;

use pocket_types::{InitializeParams, ToolInfo};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::config::ClientConfig;
use crate::decode::decode_tool_result;
use crate::endpoint::Endpoint;
use crate::error::{ClientError, Result};
use crate::helpers::require_non_empty;
use crate::protocol::{
    METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, Request, RequestId, into_result,
};
use crate::transport::{HttpTransport, Transport};

/// Lower bound for the `wait_until_healthy` deadline
const MIN_HEALTH_WAIT: Duration = Duration::from_secs(1);

/// Lower bound for the `wait_until_healthy` poll interval
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// JSON-RPC client for one PocketMCP server
#[derive(Debug)]
pub struct PocketClient {
    endpoint: Endpoint,
    /// Health probes always go over HTTP, whatever carries RPC calls
    http: HttpTransport,
    transport: Transport,
    next_id: RequestId,
}

impl PocketClient {
    /// Build a client from a config. No network activity happens here.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the config is invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.validate()?;
        let http = HttpTransport::new(&endpoint, config)?;
        let transport = Transport::for_endpoint(&endpoint, config, &http)?;

        debug!("Client for {endpoint} using {} transport", transport.kind());

        Ok(Self {
            endpoint,
            http,
            transport,
            next_id: 1,
        })
    }

    /// Build a client for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the address is empty or invalid.
    pub fn connect(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&ClientConfig::new(base_url))
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `"http"` or `"socket"`
    #[must_use]
    pub fn transport_kind(&self) -> &'static str {
        self.transport.kind()
    }

    fn next_id(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Dispatch one JSON-RPC call and return its `result`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for an empty method, otherwise any
    /// connection, protocol or RPC error from the exchange.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        require_non_empty(method, "method")?;

        let request = Request::new(self.next_id(), method, params);
        debug!(
            "-> {} (id {}) via {}",
            request.method,
            request.id,
            self.transport.kind()
        );

        let envelope = self.transport.exchange(&request).await?;
        into_result(envelope)
    }

    /// Perform the MCP `initialize` handshake.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Protocol` if the result is not an object.
    pub async fn initialize(&mut self) -> Result<Map<String, Value>> {
        let params = serde_json::to_value(InitializeParams::new(env!("CARGO_PKG_VERSION")))?;

        match self.request(METHOD_INITIALIZE, Some(params)).await? {
            Value::Object(obj) => Ok(obj),
            _ => Err(ClientError::protocol(
                "initialize response did not return an object",
            )),
        }
    }

    /// Fetch the server's tool catalogue.
    ///
    /// Entries that are not objects, or whose `name` is not a string, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Protocol` if the result has no `tools` array.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>> {
        let result = self.request(METHOD_TOOLS_LIST, None).await?;

        let Value::Object(mut obj) = result else {
            return Err(tools_list_error());
        };
        let tools = match obj.remove("tools") {
            None => return Ok(Vec::new()),
            Some(Value::Array(tools)) => tools,
            Some(_) => return Err(tools_list_error()),
        };

        Ok(tools
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(tool) => Some(tool),
                Err(e) => {
                    debug!("Skipping tools/list entry: {e}");
                    None
                }
            })
            .collect())
    }

    /// Names from [`list_tools`](Self::list_tools), in server order.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`list_tools`](Self::list_tools).
    pub async fn list_tool_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .list_tools()
            .await?
            .into_iter()
            .map(|tool| tool.name)
            .collect())
    }

    /// Invoke a tool and decode its result.
    ///
    /// `None` and `null` arguments are sent as `{}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for an empty name or non-object
    /// arguments, `ClientError::Tool` if the tool reports failure, or any
    /// error from the exchange.
    pub async fn call_tool(&mut self, name: &str, arguments: Option<Value>) -> Result<Value> {
        require_non_empty(name, "name")?;

        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args @ Value::Object(_)) => args,
            Some(_) => return Err(ClientError::validation("arguments must be a JSON object")),
        };

        let params = serde_json::json!({ "name": name, "arguments": arguments });
        let result = self.request(METHOD_TOOLS_CALL, Some(params)).await?;
        decode_tool_result(result)
    }

    /// Invoke a tool with a typed argument payload.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`call_tool`](Self::call_tool), plus
    /// `ClientError::Json` if `arguments` cannot be serialized.
    pub async fn call_tool_with<A: Serialize>(
        &mut self,
        name: &str,
        arguments: &A,
    ) -> Result<Value> {
        let arguments = serde_json::to_value(arguments)?;
        self.call_tool(name, Some(arguments)).await
    }

    /// Probe `GET <base>/health`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` or `ClientError::Protocol` on failure.
    pub async fn health(&self) -> Result<Map<String, Value>> {
        self.http.health().await
    }

    /// Poll [`health`](Self::health) until it succeeds or `timeout` elapses.
    ///
    /// `timeout` is raised to at least 1s and `poll_interval` to at least 100ms.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` once the deadline passes, quoting the
    /// last probe failure.
    pub async fn wait_until_healthy(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Map<String, Value>> {
        let timeout = timeout.max(MIN_HEALTH_WAIT);
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        // `None` when the timeout is too large to represent as an instant
        let deadline = Instant::now().checked_add(timeout);
        let mut last_error = None;

        while deadline.is_none_or(|deadline| Instant::now() < deadline) {
            match self.health().await {
                Ok(health) => return Ok(health),
                Err(e) => {
                    debug!("Health probe failed: {e}");
                    last_error = Some(e);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }

        let mut message = format!(
            "Server did not become healthy within {}s",
            timeout.as_secs()
        );
        if let Some(e) = last_error {
            message.push_str(&format!("; last error: {e}"));
        }
        Err(ClientError::Connection(message))
    }

    /// Release the transport. The client stays usable; the socket transport
    /// reconnects on the next call.
    pub async fn close(&mut self) {
        self.transport.release().await;
    }
}

fn tools_list_error() -> ClientError {
    ClientError::protocol("tools/list response did not include a tools array")
}
