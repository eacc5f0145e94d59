//! # litfetch
//!
//! Resilient multi-source acquisition of scholarly literature.
//!
//! This crate queries several scholarly APIs concurrently (arXiv,
//! Semantic Scholar, PubMed, Crossref), deduplicates and merges their
//! answers into canonical records, and ranks the result
//! deterministically. It is built as a library dependency — no network
//! listeners, no external services beyond the source APIs themselves.
//!
//! ## Design
//!
//! - Queries all configured sources concurrently; each source passes
//!   through a response cache, a per-source circuit breaker, a
//!   sliding-window rate limiter, and a bounded retry loop with
//!   exponential, jittered backoff
//! - Graceful degradation: a failing source becomes a structured
//!   diagnostic on the result, never an error — even total source
//!   failure returns an empty record set with diagnostics
//! - Duplicates across sources are detected by shared identifiers
//!   (DOI, arXiv id, PMID) with a fuzzy title-and-author fallback, and
//!   merged field-by-field so the canonical record is at least as
//!   complete as any single contributor
//! - Custom sources plug in through the [`SourceAdapter`] trait; the
//!   response cache plugs in through [`CacheStore`]
//!
//! ## Security
//!
//! - API keys come from config and are sent only to their own source;
//!   they never appear in logs or error messages
//! - Search terms are logged only at trace level
pub mod aggregate;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod source;
pub mod sources;
pub mod types;

pub use cache::{CacheStore, MemoryCache};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::{AcquireConfig, BreakerPolicy, RetryPolicy, SourceSettings};
pub use dispatch::Dispatcher;
pub use error::{AcquireError, Result, SourceError};
pub use source::SourceAdapter;
pub use types::{
    Acquisition, CandidateRecord, CanonicalRecord, DateRange, FailureKind, PubDate, Query,
    SourceDiagnostic, SourceId, SourceOutcome,
};

/// Acquire literature matching `query` from all sources in `config`.
///
/// Fans the query out concurrently, then deduplicates, merges and ranks
/// everything the sources returned. The result carries one diagnostic
/// per source describing how that source fared.
///
/// Builds a fresh [`Dispatcher`] per call; callers issuing repeated
/// queries should construct one `Dispatcher` and reuse it so cache,
/// breaker and limiter state carry across runs.
///
/// # Errors
///
/// Returns [`AcquireError::Config`] for invalid configuration and
/// [`AcquireError::InvalidQuery`] for a malformed query. Source
/// failures never surface as errors.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> litfetch::Result<()> {
/// let config = litfetch::AcquireConfig::default();
/// let query = litfetch::Query::new(["graph neural networks", "molecules"]);
/// let acquisition = litfetch::acquire(&query, &config).await?;
/// for record in &acquisition.records {
///     println!("{} ({} sources)", record.title, record.sources.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn acquire(query: &Query, config: &AcquireConfig) -> Result<Acquisition> {
    let dispatcher = Dispatcher::new(config.clone())?;
    dispatcher.run(query).await
}

/// Acquire literature with sensible default configuration.
///
/// Convenience wrapper around [`acquire`] using
/// [`AcquireConfig::default()`].
///
/// # Errors
///
/// Same as [`acquire`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> litfetch::Result<()> {
/// let query = litfetch::Query::new(["protein folding"]);
/// let acquisition = litfetch::acquire_default(&query).await?;
/// println!("{} records", acquisition.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn acquire_default(query: &Query) -> Result<Acquisition> {
    acquire(query, &AcquireConfig::default()).await
}
