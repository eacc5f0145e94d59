//! Error types for the litfetch crate.
//!
//! Two layers: [`SourceError`] is the classified per-source failure
//! taxonomy consumed by the retry and circuit-breaker logic, and
//! [`AcquireError`] is the only error surfaced to callers. Per-source
//! failures never escape the dispatcher as errors — they become
//! structured diagnostics on the final result. API keys never appear in
//! error messages.

use std::time::Duration;

use crate::types::FailureKind;

/// A classified failure from one source call.
///
/// Adapters must return one of these three kinds, never an unclassified
/// error; the dispatcher's retry policy is driven entirely by the kind.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// Network timeout, connection failure, or 5xx response. Retryable.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Explicit backpressure (HTTP 429). Retryable, but the dispatcher
    /// extends the backoff beyond the default — honoring `retry_after`
    /// when the source provided one.
    #[error("rate limited by source")]
    RateLimited { retry_after: Option<Duration> },

    /// Malformed query, authentication failure, 4xx response, or an
    /// unparseable response body. Not retryable.
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl SourceError {
    /// The diagnostic classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) => FailureKind::Transient,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Permanent(_) => FailureKind::Permanent,
        }
    }

    /// Whether the dispatcher may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent(_))
    }
}

/// Errors surfaced to the caller of the acquisition layer.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// Invalid acquisition configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The input query was malformed (empty terms, zero max-results).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Convenience type alias for caller-facing results.
pub type Result<T> = std::result::Result<T, AcquireError>;
