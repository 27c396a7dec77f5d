//! Client configuration.
//!
//! Configuration can be built in code or loaded from a JSON file
//! (`~/.config/pocket-mcp/config.json` by default). Keys are camelCase:
//!
//! ```json
//! {
//!   "baseUrl": "192.168.1.20:8080",
//!   "apiKey": "secret",
//!   "timeoutSecs": 30,
//!   "maxRetries": 2,
//!   "backoffFactor": 0.3
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::endpoint::Endpoint;
use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_factor() -> f64 {
    0.3
}

const KNOWN_KEYS: [&str; 5] = [
    "baseUrl",
    "apiKey",
    "timeoutSecs",
    "maxRetries",
    "backoffFactor",
];

/// Settings for a [`PocketClient`](crate::PocketClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Server base address; see [`Endpoint::parse`] for normalization
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as the `X-API-Key` header when set and non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds (values below 1 are raised to 1)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Multiplier for exponential backoff between HTTP retries
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The API key, ignoring an empty string
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Check the settings and normalize the base address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the base address is empty or
    /// invalid, or the backoff factor is negative or not finite.
    pub fn validate(&self) -> Result<Endpoint> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(ClientError::validation(format!(
                "backoff_factor must be a non-negative number, got {}",
                self.backoff_factor
            )));
        }

        Endpoint::parse(&self.base_url)
    }

    /// Default config file location (`<config dir>/pocket-mcp/config.json`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pocket-mcp").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load config from a JSON file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the file cannot be read or is not
    /// a valid config document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::validation(format!("failed to read {}: {e}", path.display()))
        })?;
        warn_unknown_fields(&content, &path.display().to_string());

        serde_json::from_str(&content)
            .map_err(|e| ClientError::validation(format!("invalid config {}: {e}", path.display())))
    }
}

/// Warn about top-level config keys this client does not understand.
fn warn_unknown_fields(content: &str, config_name: &str) {
    for key in unknown_keys(content) {
        warn!("Unknown config field in {config_name}: {key}");
    }
}

fn unknown_keys(content: &str) -> Vec<String> {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };

    let known: HashSet<&str> = KNOWN_KEYS.into_iter().collect();
    obj.keys()
        .filter(|key| !known.contains(key.as_str()))
        .cloned()
        .collect()
}
