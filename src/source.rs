//! Trait definition for pluggable source adapters.
//!
//! Each scholarly source (arXiv, Semantic Scholar, PubMed, Crossref)
//! implements [`SourceAdapter`] to provide a uniform capability for
//! searching and full-text retrieval. Each adapter handles its own
//! request construction and response parsing, but must normalize output
//! into [`CandidateRecord`] and classify every failure into the
//! [`SourceError`] taxonomy — no source-specific shapes or unclassified
//! errors escape the adapter boundary.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{CandidateRecord, Query, SourceId};

/// A pluggable scholarly source backend.
///
/// Implementations must be `Send + Sync`; the dispatcher queries all
/// adapters concurrently and retries individual calls, so `search` must
/// be safe to invoke repeatedly with the same query.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which source this adapter represents.
    fn source(&self) -> SourceId;

    /// Run a search against the source and return normalized candidate
    /// records, at most `query.max_results` of them.
    ///
    /// # Errors
    ///
    /// One of the three classified [`SourceError`] kinds, never anything
    /// unclassified.
    async fn search(&self, query: &Query) -> Result<Vec<CandidateRecord>, SourceError>;

    /// Fetch full-text content (typically a PDF) for a record previously
    /// returned by this source, identified by its native or external
    /// identifier. Returns `Ok(None)` when the source has no full text
    /// for the identifier.
    async fn fetch_full_text(&self, identifier: &str) -> Result<Option<Vec<u8>>, SourceError>;
}
