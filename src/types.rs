//! Core types for queries, paper records, and source identification.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::AcquireError;

/// Scholarly sources that litfetch can query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SourceId {
    /// arXiv — preprints, Atom feed API, no key required.
    ArXiv,
    /// Semantic Scholar Graph API — broad coverage, rich external identifiers.
    SemanticScholar,
    /// PubMed E-utilities — biomedical literature.
    PubMed,
    /// Crossref works API — DOI registry metadata.
    Crossref,
}

impl SourceId {
    /// Returns the human-readable name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArXiv => "arXiv",
            Self::SemanticScholar => "Semantic Scholar",
            Self::PubMed => "PubMed",
            Self::Crossref => "Crossref",
        }
    }

    /// Returns the key under which this source's native identifier is
    /// stored in a record's external-identifier map.
    pub fn id_key(&self) -> &'static str {
        match self {
            Self::ArXiv => "arxiv",
            Self::SemanticScholar => "s2",
            Self::PubMed => "pmid",
            Self::Crossref => "doi",
        }
    }

    /// Returns all available source variants.
    pub fn all() -> &'static [SourceId] {
        &[
            Self::ArXiv,
            Self::SemanticScholar,
            Self::PubMed,
            Self::Crossref,
        ]
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive publication-year range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_year: i32,
    pub end_year: i32,
}

/// A normalized literature search request.
///
/// Constructed once by the caller and shared read-only by all source
/// adapters. Terms must be non-empty; everything else is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Search terms, combined conjunctively by each adapter.
    pub terms: Vec<String>,
    /// Optional publication-year filter.
    pub date_range: Option<DateRange>,
    /// Optional subject-domain filters (source-interpreted, e.g. arXiv
    /// category prefixes).
    pub domains: Vec<String>,
    /// Upper bound on the number of records the caller wants back.
    pub max_results: usize,
}

impl Query {
    /// Build a query from search terms with no filters and a default
    /// max-results hint of 50.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            date_range: None,
            domains: Vec::new(),
            max_results: 50,
        }
    }

    /// Validates this query, returning an error if it is malformed.
    ///
    /// A malformed query is the only hard failure the acquisition layer
    /// surfaces to the caller; everything downstream degrades gracefully.
    pub fn validate(&self) -> Result<(), AcquireError> {
        if self.terms.iter().all(|t| t.trim().is_empty()) {
            return Err(AcquireError::InvalidQuery(
                "query must contain at least one non-empty term".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(AcquireError::InvalidQuery(
                "max_results must be greater than 0".into(),
            ));
        }
        if let Some(range) = self.date_range {
            if range.start_year > range.end_year {
                return Err(AcquireError::InvalidQuery(
                    "date_range start_year must be <= end_year".into(),
                ));
            }
        }
        Ok(())
    }

    /// Canonical representation used for cache keying: terms lowercased,
    /// trimmed and sorted, filters rendered in a fixed order. Two queries
    /// that differ only in term order or casing share a cache entry.
    pub fn normalized(&self) -> String {
        let mut terms: Vec<String> = self
            .terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort();
        terms.dedup();

        let mut domains: Vec<String> = self
            .domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();

        let range = self
            .date_range
            .map(|r| format!("{}-{}", r.start_year, r.end_year))
            .unwrap_or_default();

        format!("{}|{}|{}", terms.join(" "), domains.join(" "), range)
    }
}

/// A publication date that may be partial (year only, or year and month).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PubDate {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl PubDate {
    /// A year-only date.
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    /// A year and month without a day.
    pub fn ym(year: i32, month: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    /// A full calendar date.
    pub fn ymd(year: i32, month: u8, day: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    /// Number of known components (1 for year-only, up to 3 for a full
    /// date). Used by the merge step to prefer more complete dates.
    pub fn precision(&self) -> u8 {
        1 + u8::from(self.month.is_some()) + u8::from(self.day.is_some())
    }
}

/// A paper as returned by one source, before deduplication.
///
/// Produced by adapters in normalized form — no source-specific response
/// shapes escape the adapter boundary. Immutable after creation; the
/// aggregator merges candidates into new [`CanonicalRecord`]s instead of
/// mutating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Which source returned this record.
    pub source: SourceId,
    /// The source's own identifier for the paper.
    pub native_id: String,
    pub title: String,
    /// Author names in the order the source lists them.
    pub authors: Vec<String>,
    /// Publication date, possibly partial, if the source provided one.
    pub published: Option<PubDate>,
    /// Abstract text; empty string when the source has none.
    pub abstract_text: String,
    /// External identifiers ("doi", "arxiv", "pmid", ...). Keys unique;
    /// adapters always include their own native id under
    /// [`SourceId::id_key`].
    pub external_ids: BTreeMap<String, String>,
    /// Whether the source advertises retrievable full text.
    pub full_text_available: bool,
    /// Journal or venue name, if known.
    pub venue: Option<String>,
    /// Direct PDF URL, if the source exposes one.
    pub pdf_url: Option<String>,
    /// Citation count, if the source tracks one.
    pub citation_count: Option<u32>,
}

/// The merged, deduplicated representation of a paper across all sources
/// that returned it. Created only by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub published: Option<PubDate>,
    pub abstract_text: String,
    /// Union of external identifiers across the group; first non-empty
    /// value wins per key.
    pub external_ids: BTreeMap<String, String>,
    pub full_text_available: bool,
    pub venue: Option<String>,
    pub pdf_url: Option<String>,
    pub citation_count: Option<u32>,
    /// Every source that contributed a candidate to this record.
    pub sources: BTreeSet<SourceId>,
    /// Fraction of metadata fields that are populated, in `[0.0, 1.0]`.
    pub completeness: f64,
}

/// How a source failure was classified. Mirrors the retry taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Network-level or 5xx failure; was retried.
    Transient,
    /// Explicit backpressure (HTTP 429); retried with extended backoff.
    RateLimited,
    /// Bad request, auth failure, or unparseable response; not retried.
    Permanent,
}

/// Per-source result of one acquisition run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceOutcome {
    /// Records fetched over the network.
    Fetched { count: usize },
    /// Records served from the response cache; no network call.
    CacheHit { count: usize },
    /// Skipped without a network attempt because the circuit was open.
    CircuitOpen,
    /// All attempts failed; `kind` is the final classification.
    Failed { kind: FailureKind, message: String },
    /// The source did not complete before the overall deadline.
    TimedOut,
}

/// A structured per-source diagnostic attached to the final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDiagnostic {
    pub source: SourceId,
    pub outcome: SourceOutcome,
}

/// The output of one acquisition run: ranked canonical records plus one
/// diagnostic per configured source. Partial success is the normal case —
/// even total source failure yields `records: []` with diagnostics, never
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acquisition {
    pub records: Vec<CanonicalRecord>,
    pub diagnostics: Vec<SourceDiagnostic>,
}
