//! HTTP transport: one `POST` per RPC envelope, with retries for transient failures.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::API_KEY_HEADER;
use super::retry::RetryPolicy;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ClientError, Result};
use crate::protocol::Request;

/// Health probes never wait longer than this, whatever the configured timeout
pub const HEALTH_TIMEOUT_MAX: Duration = Duration::from_secs(10);

/// Maximum characters of a non-JSON body quoted in protocol errors
const SNIPPET_MAX_CHARS: usize = 220;

/// Stateless HTTP transport over a pooled `reqwest` client.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    rpc_url: String,
    health_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Build the transport for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the API key is not a valid header
    /// value, or `ClientError::Connection` if the HTTP client cannot be built.
    pub fn new(endpoint: &Endpoint, config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key() {
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                ClientError::validation("api_key contains characters not allowed in a header")
            })?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            rpc_url: endpoint.rpc_url(),
            health_url: endpoint.health_url(),
            timeout: config.timeout(),
            retry: RetryPolicy::new(config.max_retries, config.backoff_factor),
        })
    }

    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// POST an envelope and return the decoded response object.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` once retries are exhausted, or
    /// `ClientError::Protocol` if the body is not a JSON object.
    pub async fn exchange(&self, request: &Request) -> Result<Map<String, Value>> {
        self.request_json(Method::POST, &self.rpc_url, Some(request), self.timeout)
            .await
    }

    /// GET the health endpoint.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`exchange`](Self::exchange).
    pub async fn health(&self) -> Result<Map<String, Value>> {
        let timeout = self.timeout.min(HEALTH_TIMEOUT_MAX);
        self.request_json(Method::GET, &self.health_url, None, timeout)
            .await
    }

    async fn request_json(
        &self,
        method: Method,
        url: &str,
        body: Option<&Request>,
        timeout: Duration,
    ) -> Result<Map<String, Value>> {
        let response = self.send_with_retry(&method, url, body, timeout).await?;

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::connection(format!("Request failed: {e}")))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(obj)) => Ok(obj),
            Ok(_) => Err(ClientError::protocol(format!(
                "Expected JSON object response from {url}"
            ))),
            Err(_) => Err(ClientError::protocol(format!(
                "Non-JSON response from {url}: {}",
                body_snippet(&text)
            ))),
        }
    }

    async fn send_with_retry(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Request>,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let mut consecutive_errors = 0u32;

        loop {
            let mut builder = self.http.request(method.clone(), url).timeout(timeout);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let retries_left = consecutive_errors < self.retry.max_retries();

            match builder.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if !retries_left || !RetryPolicy::is_retryable_status(status) {
                        return Err(ClientError::connection(format!(
                            "Request failed: HTTP {status} for {url}"
                        )));
                    }

                    consecutive_errors += 1;
                    let delay = RetryPolicy::retry_after(status, response.headers())
                        .unwrap_or_else(|| self.retry.backoff(consecutive_errors));
                    warn!(
                        "{method} {url} returned {status}, retry {consecutive_errors}/{} in {delay:?}",
                        self.retry.max_retries()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if retries_left && RetryPolicy::is_retryable_error(&e) => {
                    consecutive_errors += 1;
                    let delay = self.retry.backoff(consecutive_errors);
                    warn!(
                        "{method} {url} failed ({e}), retry {consecutive_errors}/{} in {delay:?}",
                        self.retry.max_retries()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!("{method} {url} failed after {consecutive_errors} retries: {e}");
                    return Err(ClientError::connection(format!("Request failed: {e}")));
                }
            }
        }
    }
}

/// Single-line excerpt of a response body for diagnostics.
fn body_snippet(body: &str) -> String {
    let flat = body.trim().replace('\n', " ");
    if flat.chars().count() > SNIPPET_MAX_CHARS {
        let truncated: String = flat.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        flat
    }
}
