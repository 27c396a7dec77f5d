//! Base address normalization and endpoint derivation.
//!
//! A base address is trimmed, gets `http://` when it names no known scheme,
//! and loses any trailing slashes. The scheme decides which transport
//! carries RPC calls.

use std::fmt;

use url::Url;

use crate::error::{ClientError, Result};

const RPC_PATH: &str = "/mcp";
const HEALTH_PATH: &str = "/health";
const SOCKET_PATH: &str = "/ws";

/// URL scheme of a normalized base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ws,
    Wss,
}

impl Scheme {
    const ALL: [Scheme; 4] = [Scheme::Http, Scheme::Https, Scheme::Ws, Scheme::Wss];

    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Http => "http://",
            Scheme::Https => "https://",
            Scheme::Ws => "ws://",
            Scheme::Wss => "wss://",
        }
    }

    /// Whether RPC calls use the persistent socket transport
    #[must_use]
    pub fn is_socket(self) -> bool {
        matches!(self, Scheme::Ws | Scheme::Wss)
    }

    /// Scheme used for plain HTTP requests (the health probe) against the same host
    #[must_use]
    pub fn http_equivalent(self) -> Scheme {
        match self {
            Scheme::Http | Scheme::Ws => Scheme::Http,
            Scheme::Https | Scheme::Wss => Scheme::Https,
        }
    }

    fn detect(address: &str) -> Option<Scheme> {
        Self::ALL
            .into_iter()
            .find(|scheme| address.starts_with(scheme.prefix()))
    }
}

/// A normalized server base address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    scheme: Scheme,
}

impl Endpoint {
    /// Normalize a user-supplied base address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the address is empty or does not
    /// form a valid URL once normalized.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("base_url is required"));
        }

        let (scheme, with_scheme) = match Scheme::detect(trimmed) {
            Some(scheme) => (scheme, trimmed.to_string()),
            None => (Scheme::Http, format!("{}{trimmed}", Scheme::Http.prefix())),
        };
        let base = with_scheme.trim_end_matches('/').to_string();

        Url::parse(&base)
            .map_err(|e| ClientError::validation(format!("invalid base_url '{raw}': {e}")))?;

        Ok(Self { base, scheme })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn is_socket(&self) -> bool {
        self.scheme.is_socket()
    }

    /// URL that receives HTTP `POST`s of RPC envelopes
    #[must_use]
    pub fn rpc_url(&self) -> String {
        format!("{}{RPC_PATH}", self.base)
    }

    /// URL of the WebSocket endpoint; `/ws` is appended unless already present
    #[must_use]
    pub fn socket_url(&self) -> String {
        if self.base.ends_with(SOCKET_PATH) {
            self.base.clone()
        } else {
            format!("{}{SOCKET_PATH}", self.base)
        }
    }

    /// URL of the liveness probe, always over HTTP(S)
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.http_base())
    }

    fn http_base(&self) -> String {
        if !self.scheme.is_socket() {
            return self.base.clone();
        }

        let rest = &self.base[self.scheme.prefix().len()..];
        let rest = rest.strip_suffix(SOCKET_PATH).unwrap_or(rest);
        format!("{}{rest}", self.scheme.http_equivalent().prefix())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}
