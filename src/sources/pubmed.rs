//! PubMed source adapter.
//!
//! Two-step E-utilities flow: `esearch.fcgi` returns matching PMIDs,
//! `esummary.fcgi` returns summaries for those ids. Summaries carry no
//! abstract, so PubMed records leave `abstract_text` empty and rely on
//! the merge step to fill it from other sources. An NCBI API key from
//! config raises the permitted request rate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::SourceError;
use crate::source::SourceAdapter;
use crate::types::{CandidateRecord, PubDate, Query, SourceId};

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

/// PubMed E-utilities adapter.
pub struct PubMedAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl PubMedAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn append_key(&self, url: &mut Url) {
        if let Some(ref key) = self.api_key {
            url.query_pairs_mut().append_pair("api_key", key);
        }
    }

    async fn esearch(&self, query: &Query) -> Result<Vec<String>, SourceError> {
        let term = query
            .terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect::<Vec<_>>()
            .join(" AND ");

        let mut url = Url::parse(ESEARCH_URL)
            .map_err(|e| SourceError::Permanent(format!("PubMed URL invalid: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("db", "pubmed")
                .append_pair("term", &term)
                .append_pair("retmax", &query.max_results.to_string())
                .append_pair("retmode", "json");
            if let Some(range) = query.date_range {
                pairs
                    .append_pair("mindate", &range.start_year.to_string())
                    .append_pair("maxdate", &range.end_year.to_string())
                    .append_pair("datetype", "pdat");
            }
        }
        self.append_key(&mut url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "PubMed"))?;
        let response = crate::http::check_status(response, "PubMed")?;
        let body = response
            .text()
            .await
            .map_err(|e| crate::http::classify_transport(e, "PubMed"))?;
        parse_esearch_response(&body)
    }
}

#[async_trait]
impl SourceAdapter for PubMedAdapter {
    fn source(&self) -> SourceId {
        SourceId::PubMed
    }

    async fn search(&self, query: &Query) -> Result<Vec<CandidateRecord>, SourceError> {
        let pmids = self.esearch(query).await?;
        tracing::trace!(count = pmids.len(), "PubMed esearch ids");
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = Url::parse(ESUMMARY_URL)
            .map_err(|e| SourceError::Permanent(format!("PubMed URL invalid: {e}")))?;
        url.query_pairs_mut()
            .append_pair("db", "pubmed")
            .append_pair("id", &pmids.join(","))
            .append_pair("retmode", "json");
        self.append_key(&mut url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "PubMed"))?;
        let response = crate::http::check_status(response, "PubMed")?;
        let body = response
            .text()
            .await
            .map_err(|e| crate::http::classify_transport(e, "PubMed"))?;

        let records = parse_esummary_response(&body, query.max_results)?;
        tracing::debug!(count = records.len(), "PubMed results parsed");
        Ok(records)
    }

    /// PubMed summaries only advertise full text hosted elsewhere
    /// (PubMed Central), so direct retrieval is not offered here.
    async fn fetch_full_text(&self, _identifier: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct EsearchEnvelope {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub(crate) fn parse_esearch_response(body: &str) -> Result<Vec<String>, SourceError> {
    let envelope: EsearchEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::Permanent(format!("PubMed esearch unparseable: {e}")))?;
    Ok(envelope.esearchresult.idlist)
}

#[derive(Debug, Deserialize)]
struct EsummaryEnvelope {
    result: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PubMedSummary {
    uid: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    authors: Vec<PubMedAuthor>,
    #[serde(default)]
    articleids: Vec<ArticleId>,
    #[serde(default)]
    fulljournalname: String,
}

#[derive(Debug, Deserialize)]
struct PubMedAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArticleId {
    #[serde(default)]
    idtype: String,
    #[serde(default)]
    value: String,
}

/// Parse an esummary JSON body. The `result` object maps each uid to its
/// summary and carries a `uids` array preserving esearch rank order.
pub(crate) fn parse_esummary_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<CandidateRecord>, SourceError> {
    let envelope: EsummaryEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::Permanent(format!("PubMed esummary unparseable: {e}")))?;

    let uids: Vec<String> = envelope
        .result
        .get("uids")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    let mut records = Vec::new();
    for uid in uids {
        let Some(value) = envelope.result.get(&uid) else {
            continue;
        };
        let Ok(summary) = serde_json::from_value::<PubMedSummary>(value.clone()) else {
            // One malformed summary must not sink the whole batch.
            tracing::warn!(uid, "skipping malformed PubMed summary");
            continue;
        };
        let Some(record) = record_from_summary(summary) else {
            continue;
        };
        records.push(record);
        if records.len() >= max_results {
            break;
        }
    }
    Ok(records)
}

fn record_from_summary(summary: PubMedSummary) -> Option<CandidateRecord> {
    let title = summary.title.trim().trim_end_matches('.').to_string();
    if title.is_empty() {
        return None;
    }

    let mut external_ids = BTreeMap::new();
    external_ids.insert("pmid".to_string(), summary.uid.clone());
    let mut full_text_available = false;
    for id in &summary.articleids {
        match id.idtype.as_str() {
            "doi" if !id.value.is_empty() => {
                external_ids
                    .entry("doi".to_string())
                    .or_insert_with(|| id.value.clone());
            }
            "pmc" if !id.value.is_empty() => {
                external_ids
                    .entry("pmcid".to_string())
                    .or_insert_with(|| id.value.clone());
                full_text_available = true;
            }
            _ => {}
        }
    }

    Some(CandidateRecord {
        source: SourceId::PubMed,
        native_id: summary.uid,
        title,
        authors: summary
            .authors
            .into_iter()
            .map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect(),
        published: parse_pubdate(&summary.pubdate),
        // esummary has no abstract; merge fills it from other sources.
        abstract_text: String::new(),
        external_ids,
        full_text_available,
        venue: Some(summary.fulljournalname).filter(|v| !v.is_empty()),
        pdf_url: None,
        citation_count: None,
    })
}

/// Parse a PubMed `pubdate` like `2023 Mar 15`, `2023 Nov-Dec`, or just
/// `2023`. Month ranges keep the first month; unparseable months or days
/// degrade to coarser precision rather than dropping the date.
fn parse_pubdate(raw: &str) -> Option<PubDate> {
    let mut parts = raw.split_whitespace();
    let year: i32 = parts.next()?.parse().ok()?;
    let Some(month) = parts.next().and_then(parse_month) else {
        return Some(PubDate::year(year));
    };
    let Some(day) = parts.next().and_then(|d| d.parse::<u8>().ok()) else {
        return Some(PubDate::ym(year, month));
    };
    if (1..=31).contains(&day) {
        Some(PubDate::ymd(year, month, day))
    } else {
        Some(PubDate::ym(year, month))
    }
}

fn parse_month(raw: &str) -> Option<u8> {
    // "Nov-Dec" style ranges resolve to the first month.
    let name = raw.split('-').next().unwrap_or(raw);
    let month = match name {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}
