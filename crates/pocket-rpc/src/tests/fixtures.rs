//! Mock servers and helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request as HandshakeRequest, Response as HandshakeResponse,
};

use crate::config::ClientConfig;
use crate::protocol::{Response as RpcResponse, RpcError};

/// Config for tests: no backoff sleeps, short timeout
pub fn test_config(base: &str) -> ClientConfig {
    ClientConfig::new(base)
        .with_backoff_factor(0.0)
        .with_timeout_secs(5)
}

fn request_id(request: &Value) -> u64 {
    request["id"].as_u64().unwrap_or_default()
}

/// Successful response envelope for `request`
pub fn ok_envelope(request: &Value, result: Value) -> String {
    serde_json::to_string(&RpcResponse::success(request_id(request), result)).unwrap()
}

/// Error response envelope for `request`
pub fn error_envelope(request: &Value, error: RpcError) -> String {
    serde_json::to_string(&RpcResponse::error(request_id(request), error)).unwrap()
}

/// Envelope whose `error` member is `member` verbatim, well-formed or not
pub fn raw_error_envelope(request: &Value, member: Value) -> String {
    json!({"jsonrpc": "2.0", "id": request["id"], "error": member}).to_string()
}

/// Tool result carrying `payload` as a single JSON text part
pub fn text_content(payload: &Value) -> Value {
    json!({"content": [{"type": "text", "text": payload.to_string()}]})
}

// ============================================================================
// HTTP
// ============================================================================

/// Reply to one `POST /mcp`
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
    pub retry_after: Option<&'static str>,
}

impl HttpReply {
    pub fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            retry_after: None,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: String::new(),
            retry_after: None,
        }
    }
}

/// Called with the 0-based attempt number and the decoded request body
pub type Responder = Arc<dyn Fn(usize, &Value) -> HttpReply + Send + Sync>;

#[derive(Clone)]
pub struct MockHttp {
    responder: Responder,
    pub bodies: Arc<Mutex<Vec<Value>>>,
    pub api_keys: Arc<Mutex<Vec<Option<String>>>>,
    pub health_calls: Arc<AtomicUsize>,
    /// Health probes answer 503 while this is above zero
    pub health_failures: Arc<AtomicUsize>,
}

impl MockHttp {
    pub fn calls(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body["id"].as_u64())
            .collect()
    }

    pub fn last_body(&self) -> Value {
        self.bodies.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

async fn rpc(State(st): State<MockHttp>, headers: HeaderMap, body: String) -> Response {
    let request: Value = serde_json::from_str(&body).unwrap_or_default();
    let attempt = {
        let mut bodies = st.bodies.lock().unwrap();
        bodies.push(request.clone());
        bodies.len() - 1
    };
    st.api_keys.lock().unwrap().push(
        headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );

    let reply = (st.responder)(attempt, &request);
    let mut response = (reply.status, reply.body).into_response();
    if let Some(secs) = reply.retry_after {
        response
            .headers_mut()
            .insert("retry-after", secs.parse().unwrap());
    }
    response
}

async fn health(State(st): State<MockHttp>) -> Response {
    st.health_calls.fetch_add(1, Ordering::SeqCst);

    let failing = st
        .health_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    (StatusCode::OK, json!({"status": "ok", "tools": 31}).to_string()).into_response()
}

/// Serve `/mcp` and `/health` on an ephemeral port; returns the base address.
pub async fn start_http(
    responder: impl Fn(usize, &Value) -> HttpReply + Send + Sync + 'static,
) -> (String, MockHttp, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let st = MockHttp {
        responder: Arc::new(responder),
        bodies: Arc::default(),
        api_keys: Arc::default(),
        health_calls: Arc::default(),
        health_failures: Arc::default(),
    };

    let app = Router::new()
        .route("/mcp", post(rpc))
        .route("/health", get(health))
        .with_state(st.clone());

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://127.0.0.1:{port}"), st, handle)
}

/// HTTP server whose every RPC call returns `result`
pub async fn start_http_result(result: Value) -> (String, MockHttp, JoinHandle<()>) {
    start_http(move |_, request| HttpReply::ok(ok_envelope(request, result.clone()))).await
}

// ============================================================================
// WebSocket
// ============================================================================

/// One scripted server action
pub enum Reply {
    Text(String),
    /// Drop the connection without a close handshake
    Hangup,
}

/// Called with the 0-based connection number and the decoded request frame
pub type Script = Arc<dyn Fn(usize, &Value) -> Vec<Reply> + Send + Sync>;

#[derive(Clone, Default)]
pub struct SocketLog {
    pub connections: Arc<AtomicUsize>,
    pub paths: Arc<Mutex<Vec<String>>>,
    pub api_keys: Arc<Mutex<Vec<Option<String>>>>,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl SocketLog {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn serve_socket(stream: TcpStream, log: SocketLog, script: Script) {
    let connection = log.connections.fetch_add(1, Ordering::SeqCst);

    let record = log.clone();
    let callback = move |request: &HandshakeRequest, response: HandshakeResponse| {
        record
            .paths
            .lock()
            .unwrap()
            .push(request.uri().path().to_string());
        record.api_keys.lock().unwrap().push(
            request
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        );
        Ok::<_, ErrorResponse>(response)
    };

    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let request: Value = serde_json::from_str(&text).unwrap_or_default();
        log.requests.lock().unwrap().push(request.clone());

        for reply in script(connection, &request) {
            match reply {
                Reply::Text(frame) => {
                    if ws.send(Message::Text(frame)).await.is_err() {
                        return;
                    }
                }
                Reply::Hangup => return,
            }
        }
    }
}

/// Accept WebSocket clients on an ephemeral port; returns the `ws://` base.
pub async fn start_socket(
    script: impl Fn(usize, &Value) -> Vec<Reply> + Send + Sync + 'static,
) -> (String, SocketLog, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let log = SocketLog::default();
    let script: Script = Arc::new(script);
    let accept_log = log.clone();

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_socket(stream, accept_log.clone(), script.clone()));
        }
    });

    (format!("ws://127.0.0.1:{port}"), log, handle)
}
