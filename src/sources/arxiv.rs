//! arXiv source adapter.
//!
//! Queries the arXiv Atom API (`export.arxiv.org/api/query`). No API key
//! is required. Entry ids arrive as full `abs` URLs with a version
//! suffix; the native id is the bare identifier with the version
//! stripped, so the same paper matches across revisions.

use chrono::Datelike;
use feed_rs::model::Entry;
use url::Url;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::source::SourceAdapter;
use crate::types::{CandidateRecord, PubDate, Query, SourceId};

const API_URL: &str = "https://export.arxiv.org/api/query";
const PDF_URL: &str = "https://arxiv.org/pdf/";

/// arXiv Atom API adapter.
pub struct ArxivAdapter {
    client: reqwest::Client,
}

impl ArxivAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the arXiv `search_query` expression: terms AND-joined over
    /// all fields, domains as category prefixes, year range as a
    /// submitted-date window.
    fn build_search_query(query: &Query) -> String {
        let mut clauses: Vec<String> = query
            .terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("all:\"{}\"", t.trim()))
            .collect();

        if !query.domains.is_empty() {
            let cats: Vec<String> = query
                .domains
                .iter()
                .map(|d| format!("cat:{}*", d.trim()))
                .collect();
            clauses.push(format!("({})", cats.join(" OR ")));
        }

        if let Some(range) = query.date_range {
            clauses.push(format!(
                "submittedDate:[{}01010000 TO {}12312359]",
                range.start_year, range.end_year
            ));
        }

        clauses.join(" AND ")
    }
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn source(&self) -> SourceId {
        SourceId::ArXiv
    }

    async fn search(&self, query: &Query) -> Result<Vec<CandidateRecord>, SourceError> {
        let search_query = Self::build_search_query(query);
        tracing::trace!(search_query, "arXiv search");

        let mut url = Url::parse(API_URL)
            .map_err(|e| SourceError::Permanent(format!("arXiv URL invalid: {e}")))?;
        url.query_pairs_mut()
            .append_pair("search_query", &search_query)
            .append_pair("start", "0")
            .append_pair("max_results", &query.max_results.to_string())
            .append_pair("sortBy", "relevance");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "arXiv"))?;
        let response = crate::http::check_status(response, "arXiv")?;

        let body = response
            .bytes()
            .await
            .map_err(|e| crate::http::classify_transport(e, "arXiv"))?;

        let records = parse_arxiv_feed(&body, query.max_results)?;
        tracing::debug!(count = records.len(), "arXiv results parsed");
        Ok(records)
    }

    async fn fetch_full_text(&self, identifier: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let url = format!("{PDF_URL}{identifier}");
        tracing::trace!(identifier, "arXiv PDF fetch");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "arXiv"))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = crate::http::check_status(response, "arXiv")?;
        let body = response
            .bytes()
            .await
            .map_err(|e| crate::http::classify_transport(e, "arXiv"))?;
        Ok(Some(body.to_vec()))
    }
}

/// Parse an arXiv Atom response into candidate records.
///
/// Separate from the adapter for testability with fixture feeds.
pub(crate) fn parse_arxiv_feed(
    body: &[u8],
    max_results: usize,
) -> Result<Vec<CandidateRecord>, SourceError> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| SourceError::Permanent(format!("arXiv feed unparseable: {e}")))?;

    let mut records = Vec::new();
    for entry in feed.entries {
        let Some(record) = record_from_entry(entry) else {
            continue;
        };
        records.push(record);
        if records.len() >= max_results {
            break;
        }
    }
    Ok(records)
}

fn record_from_entry(entry: Entry) -> Option<CandidateRecord> {
    let native_id = native_id_from_entry_id(&entry.id)?;

    let title = collapse_whitespace(&entry.title.map(|t| t.content).unwrap_or_default());
    if title.is_empty() {
        return None;
    }

    let abstract_text =
        collapse_whitespace(&entry.summary.map(|t| t.content).unwrap_or_default());

    let authors: Vec<String> = entry
        .authors
        .into_iter()
        .map(|p| p.name)
        .filter(|n| !n.is_empty())
        .collect();

    let published = entry
        .published
        .map(|d| PubDate::ymd(d.year(), d.month() as u8, d.day() as u8));

    let pdf_url = entry
        .links
        .iter()
        .find(|l| {
            l.media_type.as_deref() == Some("application/pdf")
                || l.title.as_deref() == Some("pdf")
        })
        .map(|l| l.href.clone());

    let mut external_ids = std::collections::BTreeMap::new();
    external_ids.insert("arxiv".to_string(), native_id.clone());

    Some(CandidateRecord {
        source: SourceId::ArXiv,
        native_id,
        title,
        authors,
        published,
        abstract_text,
        external_ids,
        // Every arXiv entry has a PDF rendition.
        full_text_available: true,
        venue: None,
        pdf_url,
        citation_count: None,
    })
}

/// Extract the bare arXiv id from an Atom entry id like
/// `http://arxiv.org/abs/2301.00001v2`, stripping the version suffix.
fn native_id_from_entry_id(entry_id: &str) -> Option<String> {
    let raw = entry_id
        .split_once("/abs/")
        .map(|(_, tail)| tail)
        .unwrap_or(entry_id);
    if raw.is_empty() {
        return None;
    }
    Some(strip_version(raw).to_string())
}

/// Drop a trailing `vN` revision marker if present.
fn strip_version(id: &str) -> &str {
    if let Some(pos) = id.rfind('v') {
        if pos > 0 && id[pos + 1..].chars().all(|c| c.is_ascii_digit()) && pos + 1 < id.len() {
            return &id[..pos];
        }
    }
    id
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
