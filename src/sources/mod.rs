//! Built-in source adapters.
//!
//! One module per scholarly source; [`build_adapters`] assembles the set
//! enabled in config around a shared HTTP client.

pub mod arxiv;
pub mod crossref;
pub mod pubmed;
pub mod semantic_scholar;

pub use arxiv::ArxivAdapter;
pub use crossref::CrossrefAdapter;
pub use pubmed::PubMedAdapter;
pub use semantic_scholar::SemanticScholarAdapter;

use crate::config::AcquireConfig;
use crate::error::AcquireError;
use crate::source::SourceAdapter;
use crate::types::SourceId;

/// Construct an adapter per enabled source, all sharing one HTTP client.
pub(crate) fn build_adapters(
    config: &AcquireConfig,
) -> Result<Vec<Box<dyn SourceAdapter>>, AcquireError> {
    let client = crate::http::build_client(config)
        .map_err(|e| AcquireError::Config(e.to_string()))?;

    let adapters = config
        .sources
        .iter()
        .map(|&source| {
            let api_key = config.source_settings(source).api_key.clone();
            let adapter: Box<dyn SourceAdapter> = match source {
                SourceId::ArXiv => Box::new(ArxivAdapter::new(client.clone())),
                SourceId::SemanticScholar => {
                    Box::new(SemanticScholarAdapter::new(client.clone(), api_key))
                }
                SourceId::PubMed => Box::new(PubMedAdapter::new(client.clone(), api_key)),
                SourceId::Crossref => Box::new(CrossrefAdapter::new(client.clone())),
            };
            adapter
        })
        .collect();
    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_adapter_per_enabled_source() {
        let config = AcquireConfig::default();
        let adapters = build_adapters(&config).expect("build");
        assert_eq!(adapters.len(), config.sources.len());
        for (adapter, &source) in adapters.iter().zip(config.sources.iter()) {
            assert_eq!(adapter.source(), source);
        }
    }

    #[test]
    fn respects_source_subset() {
        let config = AcquireConfig {
            sources: vec![SourceId::ArXiv, SourceId::Crossref],
            ..Default::default()
        };
        let adapters = build_adapters(&config).expect("build");
        assert_eq!(adapters.len(), 2);
        assert_eq!(adapters[0].source(), SourceId::ArXiv);
        assert_eq!(adapters[1].source(), SourceId::Crossref);
    }
}
