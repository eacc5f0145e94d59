//! Crossref source adapter.
//!
//! Queries the REST works endpoint (`api.crossref.org/works`). No API
//! key is needed; an identifying User-Agent on the shared client keeps
//! us on the polite pool. DOIs double as native ids, making Crossref
//! records strong merge anchors. Abstracts arrive as JATS XML fragments
//! and are flattened to plain text.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::SourceError;
use crate::source::SourceAdapter;
use crate::types::{CandidateRecord, PubDate, Query, SourceId};

const API_URL: &str = "https://api.crossref.org/works";

/// Crossref REST API adapter.
pub struct CrossrefAdapter {
    client: reqwest::Client,
}

impl CrossrefAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for CrossrefAdapter {
    fn source(&self) -> SourceId {
        SourceId::Crossref
    }

    async fn search(&self, query: &Query) -> Result<Vec<CandidateRecord>, SourceError> {
        let terms = query.terms.join(" ");
        tracing::trace!(terms, "Crossref search");

        let mut url = Url::parse(API_URL)
            .map_err(|e| SourceError::Permanent(format!("Crossref URL invalid: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", &terms)
                .append_pair("rows", &query.max_results.to_string());
            if let Some(range) = query.date_range {
                pairs.append_pair(
                    "filter",
                    &format!(
                        "from-pub-date:{}-01-01,until-pub-date:{}-12-31",
                        range.start_year, range.end_year
                    ),
                );
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Crossref"))?;
        let response = crate::http::check_status(response, "Crossref")?;
        let body = response
            .text()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Crossref"))?;

        let records = parse_works_response(&body, query.max_results)?;
        tracing::debug!(count = records.len(), "Crossref results parsed");
        Ok(records)
    }

    /// Crossref is a metadata registry; full text lives with publishers
    /// behind varying access controls, so none is fetched here.
    async fn fetch_full_text(&self, _identifier: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct WorksEnvelope {
    message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_jats: Option<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    issued: Option<serde_json::Value>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "is-referenced-by-count")]
    is_referenced_by_count: Option<u32>,
    #[serde(default)]
    link: Vec<WorkLink>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkLink {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

/// Parse a Crossref works response body into candidate records.
pub(crate) fn parse_works_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<CandidateRecord>, SourceError> {
    let envelope: WorksEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::Permanent(format!("Crossref response unparseable: {e}")))?;

    let mut records = Vec::new();
    for work in envelope.message.items {
        let Some(record) = record_from_work(work) else {
            continue;
        };
        records.push(record);
        if records.len() >= max_results {
            break;
        }
    }
    Ok(records)
}

fn record_from_work(work: Work) -> Option<CandidateRecord> {
    let doi = work.doi?.to_lowercase();
    let title = work
        .title
        .first()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let mut external_ids = BTreeMap::new();
    external_ids.insert("doi".to_string(), doi.clone());

    let pdf_url = work
        .link
        .iter()
        .find(|l| l.content_type.as_deref() == Some("application/pdf"))
        .and_then(|l| l.url.clone());

    Some(CandidateRecord {
        source: SourceId::Crossref,
        native_id: doi,
        title,
        authors: work.author.iter().filter_map(author_name).collect(),
        published: work.issued.as_ref().and_then(parse_date_parts),
        abstract_text: work
            .abstract_jats
            .as_deref()
            .map(strip_jats_tags)
            .unwrap_or_default(),
        external_ids,
        full_text_available: pdf_url.is_some(),
        venue: work
            .container_title
            .into_iter()
            .find(|v| !v.is_empty()),
        pdf_url,
        citation_count: work.is_referenced_by_count,
    })
}

fn author_name(author: &WorkAuthor) -> Option<String> {
    let name = match (author.given.as_deref(), author.family.as_deref()) {
        (Some(given), Some(family)) => format!("{given} {family}"),
        (None, Some(family)) => family.to_string(),
        (Some(given), None) => given.to_string(),
        (None, None) => return None,
    };
    Some(name).filter(|n| !n.trim().is_empty())
}

/// Extract a [`PubDate`] from an `issued.date-parts` array like
/// `[[2023, 3, 15]]`. Shorter arrays yield coarser precision.
fn parse_date_parts(issued: &serde_json::Value) -> Option<PubDate> {
    let parts = issued.get("date-parts")?.get(0)?.as_array()?;
    let year = parts.first()?.as_i64()? as i32;
    let month = parts.get(1).and_then(|v| v.as_u64()).map(|m| m as u8);
    let day = parts.get(2).and_then(|v| v.as_u64()).map(|d| d as u8);
    match (month, day) {
        (Some(m), Some(d)) if (1..=12).contains(&m) && (1..=31).contains(&d) => {
            Some(PubDate::ymd(year, m, d))
        }
        (Some(m), _) if (1..=12).contains(&m) => Some(PubDate::ym(year, m)),
        _ => Some(PubDate::year(year)),
    }
}

/// Flatten a JATS abstract fragment to plain text by dropping tags and
/// collapsing whitespace.
fn strip_jats_tags(jats: &str) -> String {
    let mut text = String::with_capacity(jats.len());
    let mut in_tag = false;
    for c in jats.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
