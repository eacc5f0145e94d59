//! TTL-bound cache of prior source responses.
//!
//! Entries are keyed by (source, normalized query) so that semantically
//! identical queries share an entry regardless of surface phrasing. The
//! backing store is pluggable behind [`CacheStore`]; the bundled
//! [`MemoryCache`] uses [`moka`] for capacity-bounded storage while
//! checking each entry's TTL explicitly on read, so an entry is never
//! served past its TTL (expired entries are treated as absent, not as
//! stale data).
//!
//! The cache is purely a cost optimization: removing it changes latency
//! and call volume, never correctness.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::time::Instant;

use crate::config::AcquireConfig;
use crate::types::{CandidateRecord, SourceId};

/// Maximum cached result sets held per source.
const MAX_ENTRIES_PER_SOURCE: u64 = 256;

/// Pluggable response-cache backing store.
///
/// An in-process store and a shared/distributed store must be
/// interchangeable without changing dispatcher behaviour beyond latency.
/// Writes replace the whole entry atomically; readers never observe a
/// partially written entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Non-expired records for this (source, query), if cached.
    async fn get(&self, source: SourceId, query_key: &str) -> Option<Arc<Vec<CandidateRecord>>>;

    /// Insert or overwrite the entry for this (source, query).
    async fn put(&self, source: SourceId, query_key: String, records: Arc<Vec<CandidateRecord>>);
}

#[derive(Clone)]
struct Entry {
    records: Arc<Vec<CandidateRecord>>,
    created: Instant,
    ttl: Duration,
}

/// In-process cache with one namespace per source.
///
/// Per-source TTLs come from config at construction. A TTL of zero
/// disables caching for that source.
pub struct MemoryCache {
    namespaces: HashMap<SourceId, Namespace>,
}

struct Namespace {
    ttl: Duration,
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    /// Create a cache covering every source enabled in `config`.
    pub fn new(config: &AcquireConfig) -> Self {
        let namespaces = config
            .sources
            .iter()
            .map(|&source| {
                let settings = config.source_settings(source);
                (
                    source,
                    Namespace {
                        ttl: settings.cache_ttl,
                        entries: Cache::builder()
                            .max_capacity(MAX_ENTRIES_PER_SOURCE)
                            .build(),
                    },
                )
            })
            .collect();
        Self { namespaces }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, source: SourceId, query_key: &str) -> Option<Arc<Vec<CandidateRecord>>> {
        let namespace = self.namespaces.get(&source)?;
        let entry = namespace.entries.get(query_key).await?;
        if entry.created.elapsed() >= entry.ttl {
            // Lazy expiration: drop the stale entry on read.
            namespace.entries.invalidate(query_key).await;
            return None;
        }
        Some(entry.records)
    }

    async fn put(&self, source: SourceId, query_key: String, records: Arc<Vec<CandidateRecord>>) {
        let Some(namespace) = self.namespaces.get(&source) else {
            return;
        };
        if namespace.ttl.is_zero() {
            return;
        }
        let entry = Entry {
            records,
            created: Instant::now(),
            ttl: namespace.ttl,
        };
        namespace.entries.insert(query_key, entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSettings;
    use crate::types::PubDate;
    use std::collections::BTreeMap;

    fn cache_with_ttl(ttl: Duration) -> MemoryCache {
        let mut config = AcquireConfig::default();
        for source in SourceId::all() {
            config.per_source.insert(
                *source,
                SourceSettings {
                    cache_ttl: ttl,
                    ..Default::default()
                },
            );
        }
        MemoryCache::new(&config)
    }

    fn records(title: &str) -> Arc<Vec<CandidateRecord>> {
        Arc::new(vec![CandidateRecord {
            source: SourceId::ArXiv,
            native_id: "2301.00001".into(),
            title: title.into(),
            authors: vec![],
            published: Some(PubDate::year(2023)),
            abstract_text: String::new(),
            external_ids: BTreeMap::new(),
            full_text_available: false,
            venue: None,
            pdf_url: None,
            citation_count: None,
        }])
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = cache_with_ttl(Duration::from_secs(600));
        assert!(cache.get(SourceId::ArXiv, "nothing|").await.is_none());
    }

    #[tokio::test]
    async fn insert_then_hit() {
        let cache = cache_with_ttl(Duration::from_secs(600));
        cache
            .put(SourceId::ArXiv, "attention|".into(), records("Cached"))
            .await;
        let hit = cache.get(SourceId::ArXiv, "attention|").await;
        assert_eq!(hit.expect("hit")[0].title, "Cached");
    }

    #[tokio::test]
    async fn namespaces_are_per_source() {
        let cache = cache_with_ttl(Duration::from_secs(600));
        cache
            .put(SourceId::ArXiv, "attention|".into(), records("From arXiv"))
            .await;
        assert!(cache.get(SourceId::PubMed, "attention|").await.is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_whole_entry() {
        let cache = cache_with_ttl(Duration::from_secs(600));
        cache
            .put(SourceId::ArXiv, "k|".into(), records("Old"))
            .await;
        cache
            .put(SourceId::ArXiv, "k|".into(), records("New"))
            .await;
        let hit = cache.get(SourceId::ArXiv, "k|").await;
        assert_eq!(hit.expect("hit")[0].title, "New");
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_absent() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        cache
            .put(SourceId::ArXiv, "k|".into(), records("Short-lived"))
            .await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(cache.get(SourceId::ArXiv, "k|").await.is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cache.get(SourceId::ArXiv, "k|").await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = cache_with_ttl(Duration::ZERO);
        cache
            .put(SourceId::ArXiv, "k|".into(), records("Never stored"))
            .await;
        assert!(cache.get(SourceId::ArXiv, "k|").await.is_none());
    }
}
