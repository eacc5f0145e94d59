//! Semantic Scholar source adapter.
//!
//! Queries the Graph API (`api.semanticscholar.org/graph/v1`). Works
//! without a key against the shared public budget; an API key from
//! config is sent as `x-api-key`. Richest source of external
//! identifiers, so its records often stitch the other sources' records
//! together during deduplication.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::SourceError;
use crate::source::SourceAdapter;
use crate::types::{CandidateRecord, PubDate, Query, SourceId};

const API_URL: &str = "https://api.semanticscholar.org/graph/v1";

const SEARCH_FIELDS: &str = "paperId,externalIds,title,abstract,venue,year,publicationDate,authors,citationCount,isOpenAccess,openAccessPdf";

/// Semantic Scholar Graph API adapter.
pub struct SemanticScholarAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SemanticScholarAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }
        request
    }

    /// Route an identifier to the Graph API's prefixed paper endpoint,
    /// mirroring how identifiers are commonly shaped: DOIs start with
    /// `10.`, arXiv ids are dotted and start with a digit, PubMed ids are
    /// all digits, anything else is treated as a native S2 id.
    fn paper_endpoint(identifier: &str) -> String {
        if identifier.starts_with("10.") {
            format!("paper/DOI:{identifier}")
        } else if let Some(rest) = identifier.strip_prefix("arXiv:") {
            format!("paper/ArXiv:{rest}")
        } else if identifier.chars().all(|c| c.is_ascii_digit()) {
            format!("paper/PMID:{identifier}")
        } else if identifier.contains('.')
            && identifier.starts_with(|c: char| c.is_ascii_digit())
        {
            format!("paper/ArXiv:{identifier}")
        } else {
            format!("paper/{identifier}")
        }
    }
}

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn source(&self) -> SourceId {
        SourceId::SemanticScholar
    }

    async fn search(&self, query: &Query) -> Result<Vec<CandidateRecord>, SourceError> {
        let terms = query.terms.join(" ");
        tracing::trace!(terms, "Semantic Scholar search");

        let mut url = Url::parse(&format!("{API_URL}/paper/search"))
            .map_err(|e| SourceError::Permanent(format!("S2 URL invalid: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", &terms)
                .append_pair("limit", &query.max_results.min(100).to_string())
                .append_pair("fields", SEARCH_FIELDS);
            if let Some(range) = query.date_range {
                pairs.append_pair("year", &format!("{}-{}", range.start_year, range.end_year));
            }
        }

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;
        let response = crate::http::check_status(response, "Semantic Scholar")?;

        let body = response
            .text()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;

        let records = parse_search_response(&body, query.max_results)?;
        tracing::debug!(count = records.len(), "Semantic Scholar results parsed");
        Ok(records)
    }

    async fn fetch_full_text(&self, identifier: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let endpoint = Self::paper_endpoint(identifier);
        let mut url = Url::parse(&format!("{API_URL}/{endpoint}"))
            .map_err(|e| SourceError::Permanent(format!("S2 URL invalid: {e}")))?;
        url.query_pairs_mut()
            .append_pair("fields", "openAccessPdf");

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = crate::http::check_status(response, "Semantic Scholar")?;

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PdfLookup {
            open_access_pdf: Option<OpenAccessPdf>,
        }

        let lookup: PdfLookup = response
            .json()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;
        let Some(pdf) = lookup.open_access_pdf.and_then(|p| p.url) else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&pdf)
            .send()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;
        let response = crate::http::check_status(response, "Semantic Scholar")?;
        let body = response
            .bytes()
            .await
            .map_err(|e| crate::http::classify_transport(e, "Semantic Scholar"))?;
        Ok(Some(body.to_vec()))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    external_ids: Option<BTreeMap<String, serde_json::Value>>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
    year: Option<i32>,
    publication_date: Option<String>,
    #[serde(default)]
    authors: Vec<S2Author>,
    citation_count: Option<u32>,
    is_open_access: Option<bool>,
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    url: Option<String>,
}

/// Parse a Graph API search response body into candidate records.
pub(crate) fn parse_search_response(
    body: &str,
    max_results: usize,
) -> Result<Vec<CandidateRecord>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Permanent(format!("S2 response unparseable: {e}")))?;

    let mut records = Vec::new();
    for paper in response.data {
        let Some(record) = record_from_paper(paper) else {
            continue;
        };
        records.push(record);
        if records.len() >= max_results {
            break;
        }
    }
    Ok(records)
}

fn record_from_paper(paper: S2Paper) -> Option<CandidateRecord> {
    let native_id = paper.paper_id?;
    let title = paper.title.unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return None;
    }

    let mut external_ids = BTreeMap::new();
    external_ids.insert("s2".to_string(), native_id.clone());
    for (key, value) in paper.external_ids.unwrap_or_default() {
        let Some(value) = stringify_id(&value) else {
            continue;
        };
        let key = match key.as_str() {
            "DOI" => "doi",
            "ArXiv" => "arxiv",
            "PubMed" => "pmid",
            "PubMedCentral" => "pmcid",
            "CorpusId" => "corpus",
            other => {
                external_ids
                    .entry(other.to_lowercase())
                    .or_insert(value);
                continue;
            }
        };
        external_ids.entry(key.to_string()).or_insert(value);
    }

    let published = paper
        .publication_date
        .as_deref()
        .and_then(parse_iso_date)
        .or(paper.year.map(PubDate::year));

    let pdf_url = paper.open_access_pdf.and_then(|p| p.url);
    let full_text_available = paper.is_open_access.unwrap_or(false) || pdf_url.is_some();

    Some(CandidateRecord {
        source: SourceId::SemanticScholar,
        native_id,
        title,
        authors: paper
            .authors
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect(),
        published,
        abstract_text: paper.abstract_text.unwrap_or_default().trim().to_string(),
        external_ids,
        full_text_available,
        venue: paper.venue.filter(|v| !v.is_empty()),
        pdf_url,
        citation_count: paper.citation_count,
    })
}

/// External-id values are strings or numbers depending on the id type.
fn stringify_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` publication date.
fn parse_iso_date(raw: &str) -> Option<PubDate> {
    let mut parts = raw.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(PubDate::ymd(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_S2_JSON: &str = r#"{
      "total": 2,
      "offset": 0,
      "data": [
        {
          "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
          "externalIds": {"DOI": "10.1234/example.2023", "ArXiv": "2301.00001", "CorpusId": 2314124},
          "title": "Attention Is Not All You Need",
          "abstract": "We revisit the attention mechanism.",
          "venue": "NeurIPS",
          "year": 2023,
          "publicationDate": "2023-01-02",
          "authors": [{"authorId": "1", "name": "Ada Lovelace"}, {"authorId": "2", "name": "Charles Babbage"}],
          "citationCount": 42,
          "isOpenAccess": true,
          "openAccessPdf": {"url": "https://example.org/paper.pdf"}
        },
        {
          "paperId": "abc123",
          "externalIds": {},
          "title": "A Closed-Access Paper",
          "abstract": null,
          "venue": "",
          "year": 2021,
          "publicationDate": null,
          "authors": [],
          "citationCount": 0,
          "isOpenAccess": false,
          "openAccessPdf": null
        }
      ]
    }"#;

    #[test]
    fn parse_mock_response() {
        let records = parse_search_response(MOCK_S2_JSON, 10).expect("parse");
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.source, SourceId::SemanticScholar);
        assert_eq!(first.native_id, "649def34f8be52c8b66281af98ae884c09aef38b");
        assert_eq!(first.external_ids.get("doi").map(String::as_str), Some("10.1234/example.2023"));
        assert_eq!(first.external_ids.get("arxiv").map(String::as_str), Some("2301.00001"));
        assert_eq!(first.external_ids.get("corpus").map(String::as_str), Some("2314124"));
        assert_eq!(first.published, Some(PubDate::ymd(2023, 1, 2)));
        assert_eq!(first.citation_count, Some(42));
        assert!(first.full_text_available);
        assert_eq!(first.venue.as_deref(), Some("NeurIPS"));
    }

    #[test]
    fn missing_fields_degrade_gracefully() {
        let records = parse_search_response(MOCK_S2_JSON, 10).expect("parse");
        let second = &records[1];
        assert_eq!(second.abstract_text, "");
        assert_eq!(second.published, Some(PubDate::year(2021)));
        assert!(!second.full_text_available);
        assert!(second.venue.is_none());
        assert!(second.authors.is_empty());
    }

    #[test]
    fn empty_data_yields_empty() {
        let records =
            parse_search_response(r#"{"total": 0, "offset": 0}"#, 10).expect("parse");
        assert!(records.is_empty());
    }

    #[test]
    fn garbage_is_permanent() {
        let err = parse_search_response("<html>nope</html>", 10).expect_err("fail");
        assert!(!err.is_retryable());
    }

    #[test]
    fn iso_date_parsing() {
        assert_eq!(parse_iso_date("2023-01-02"), Some(PubDate::ymd(2023, 1, 2)));
        assert_eq!(parse_iso_date("2023-13-02"), None);
        assert_eq!(parse_iso_date("2023"), None);
        assert_eq!(parse_iso_date("not-a-date"), None);
    }

    #[test]
    fn paper_endpoint_routing() {
        assert_eq!(
            SemanticScholarAdapter::paper_endpoint("10.1234/x"),
            "paper/DOI:10.1234/x"
        );
        assert_eq!(
            SemanticScholarAdapter::paper_endpoint("2301.00001"),
            "paper/ArXiv:2301.00001"
        );
        assert_eq!(
            SemanticScholarAdapter::paper_endpoint("34567890"),
            "paper/PMID:34567890"
        );
        assert_eq!(
            SemanticScholarAdapter::paper_endpoint("arXiv:2301.00001"),
            "paper/ArXiv:2301.00001"
        );
        assert_eq!(
            SemanticScholarAdapter::paper_endpoint("649def34f8be52c8b66"),
            "paper/649def34f8be52c8b66"
        );
    }
}
