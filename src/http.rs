//! Shared HTTP client construction and failure classification.
//!
//! Provides a configured [`reqwest::Client`] for the scholarly APIs and
//! the single place where transport errors and HTTP status codes are
//! mapped onto the [`SourceError`] taxonomy, so every adapter classifies
//! failures identically.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::AcquireConfig;
use crate::error::SourceError;

/// Identifying User-Agent sent to all sources (Crossref etiquette asks
/// for an identifiable agent, not a browser string).
const USER_AGENT: &str = concat!(
    "litfetch/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/saorsa-labs/litfetch)"
);

/// Build a [`reqwest::Client`] configured for API access.
///
/// The client has the configured timeout, gzip/brotli decompression, and
/// either the custom User-Agent from config or the identifying default.
///
/// # Errors
///
/// Returns [`SourceError::Permanent`] if the client cannot be constructed.
pub fn build_client(config: &AcquireConfig) -> Result<reqwest::Client, SourceError> {
    let ua = config.user_agent.as_deref().unwrap_or(USER_AGENT);

    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SourceError::Permanent(format!("failed to build HTTP client: {e}")))
}

/// Map a transport-level [`reqwest::Error`] onto the failure taxonomy.
///
/// Timeouts and connection failures are transient; response-decoding
/// failures are permanent (a retry would re-read the same body).
pub fn classify_transport(err: reqwest::Error, source: &str) -> SourceError {
    if err.is_timeout() || err.is_connect() {
        SourceError::Transient(format!("{source} request failed: {err}"))
    } else if err.is_decode() || err.is_builder() {
        SourceError::Permanent(format!("{source} response unreadable: {err}"))
    } else {
        SourceError::Transient(format!("{source} request failed: {err}"))
    }
}

/// Check a response's status code, consuming error statuses into the
/// failure taxonomy: 429 → rate-limited (with any `Retry-After`),
/// 5xx → transient, other 4xx → permanent.
pub fn check_status(response: reqwest::Response, source: &str) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited {
            retry_after: retry_after(&response),
        });
    }
    if status.is_server_error() {
        return Err(SourceError::Transient(format!(
            "{source} returned {status}"
        )));
    }
    Err(SourceError::Permanent(format!(
        "{source} returned {status}"
    )))
}

/// Parse a `Retry-After` header as a delay in seconds, if present.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
