//! Retry policy for transient HTTP failures.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Upper bound for any single backoff delay
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Status codes treated as transient
pub const RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Exponential backoff policy applied by the HTTP transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor: if backoff_factor.is_finite() {
                backoff_factor.max(0.0)
            } else {
                0.0
            },
        }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Connection failures, timeouts, and failures while sending the request.
    #[must_use]
    pub fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout() || error.is_request()
    }

    /// Delay before the next attempt after `consecutive_errors` failures.
    ///
    /// The first retry happens immediately; after that the delay is
    /// `backoff_factor * 2^(n-1)` seconds, capped at [`BACKOFF_MAX`].
    #[must_use]
    pub fn backoff(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(consecutive_errors - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(BACKOFF_MAX.as_secs_f64()))
    }

    /// Server-requested delay from a `Retry-After: <seconds>` header on 429/503.
    #[must_use]
    pub fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
        if !matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return None;
        }

        let secs: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
        Some(Duration::from_secs(secs).min(BACKOFF_MAX))
    }
}
