//! Concurrent query fan-out across sources.
//!
//! The [`Dispatcher`] owns the adapters and the resilience machinery
//! around them. One `run` fans the query out to every configured source
//! concurrently; each source independently passes through cache lookup,
//! circuit-breaker admission, rate limiting, and a bounded retry loop.
//! Slow sources are abandoned at the overall deadline. Per-source
//! failures degrade the result instead of failing it: the caller always
//! gets whatever the healthy sources returned, plus one structured
//! diagnostic per source.

mod backoff;

use std::sync::Arc;

use futures::future::join_all;

use crate::aggregate;
use crate::cache::{CacheStore, MemoryCache};
use crate::circuit_breaker::{Admission, CircuitBreaker, CircuitState};
use crate::config::AcquireConfig;
use crate::error::{AcquireError, SourceError};
use crate::rate_limit::RateLimiter;
use crate::source::SourceAdapter;
use crate::sources::build_adapters;
use crate::types::{Acquisition, CandidateRecord, Query, SourceDiagnostic, SourceOutcome};

/// Fan-out coordinator for literature queries.
///
/// Construct once and reuse: the circuit breaker and rate limiter carry
/// state across runs, which is what lets repeated queries back off from
/// an unhealthy source.
pub struct Dispatcher {
    adapters: Vec<Box<dyn SourceAdapter>>,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    cache: Box<dyn CacheStore>,
    config: AcquireConfig,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in adapters for every source
    /// enabled in `config`.
    ///
    /// # Errors
    ///
    /// [`AcquireError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: AcquireConfig) -> Result<Self, AcquireError> {
        config.validate()?;
        let adapters = build_adapters(&config)?;
        Ok(Self::assemble(config, adapters))
    }

    /// Create a dispatcher over caller-supplied adapters.
    ///
    /// The adapter set replaces the built-ins entirely; each adapter's
    /// [`SourceAdapter::source`] decides which per-source settings,
    /// breaker and limiter state apply to it.
    pub fn with_adapters(
        config: AcquireConfig,
        adapters: Vec<Box<dyn SourceAdapter>>,
    ) -> Result<Self, AcquireError> {
        config.validate()?;
        Ok(Self::assemble(config, adapters))
    }

    /// Swap the response-cache backing store.
    pub fn with_cache(mut self, cache: Box<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    fn assemble(config: AcquireConfig, adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        let sources: Vec<_> = adapters.iter().map(|a| a.source()).collect();
        Self {
            limiter: RateLimiter::new(&config),
            breaker: CircuitBreaker::new(config.breaker.clone(), &sources),
            cache: Box::new(MemoryCache::new(&config)),
            adapters,
            config,
        }
    }

    /// Run one acquisition: fan the query out, gather what the sources
    /// return, and deduplicate, merge and rank the union.
    ///
    /// Source failures never surface here — they become diagnostics on
    /// the [`Acquisition`]. Even total source failure returns `Ok` with
    /// empty records.
    ///
    /// # Errors
    ///
    /// [`AcquireError::InvalidQuery`] if the query is malformed.
    pub async fn run(&self, query: &Query) -> Result<Acquisition, AcquireError> {
        query.validate()?;
        let query_key = query.normalized();
        let query_key = query_key.as_str();

        let tasks = self.adapters.iter().map(|adapter| async move {
            let source = adapter.source();
            let work = self.fetch_source(adapter.as_ref(), query, query_key);
            match tokio::time::timeout(self.config.deadline, work).await {
                Ok((outcome, records)) => (source, outcome, records),
                Err(_) => {
                    // An abandoned call counts against the source's
                    // health like any other failure.
                    self.breaker.record_failure(source);
                    tracing::warn!(%source, "abandoned at deadline");
                    (source, SourceOutcome::TimedOut, Vec::new())
                }
            }
        });

        let mut candidates = Vec::new();
        let mut diagnostics = Vec::new();
        for (source, outcome, records) in join_all(tasks).await {
            candidates.extend(records);
            diagnostics.push(SourceDiagnostic { source, outcome });
        }

        let cap = self.config.max_results.min(query.max_results);
        let records = aggregate::aggregate(candidates, cap);
        tracing::info!(
            records = records.len(),
            sources = diagnostics.len(),
            "acquisition complete"
        );
        Ok(Acquisition {
            records,
            diagnostics,
        })
    }

    /// One source's full journey: cache, breaker admission, then the
    /// rate-limited retry loop.
    async fn fetch_source(
        &self,
        adapter: &dyn SourceAdapter,
        query: &Query,
        query_key: &str,
    ) -> (SourceOutcome, Vec<CandidateRecord>) {
        let source = adapter.source();

        if let Some(cached) = self.cache.get(source, query_key).await {
            tracing::debug!(%source, count = cached.len(), "cache hit");
            return (
                SourceOutcome::CacheHit {
                    count: cached.len(),
                },
                (*cached).clone(),
            );
        }

        let admission = self.breaker.try_acquire(source);
        if admission == Admission::Rejected {
            tracing::debug!(%source, "skipped, circuit open");
            return (SourceOutcome::CircuitOpen, Vec::new());
        }
        // A half-open probe gets exactly one attempt; its outcome decides
        // whether the circuit closes or reopens.
        let max_attempts = match admission {
            Admission::Probe => 1,
            _ => self.config.retry.max_attempts,
        };

        let mut attempt = 0;
        loop {
            self.limiter.acquire(source).await;
            let error = match adapter.search(query).await {
                Ok(records) => {
                    self.breaker.record_success(source);
                    self.cache
                        .put(source, query_key.to_string(), Arc::new(records.clone()))
                        .await;
                    tracing::debug!(%source, count = records.len(), "fetched");
                    return (
                        SourceOutcome::Fetched {
                            count: records.len(),
                        },
                        records,
                    );
                }
                Err(e) => e,
            };

            let exhausted = attempt + 1 >= max_attempts || !error.is_retryable();
            if exhausted {
                // One breaker failure per logical call: retries within
                // the call escalate to a single recorded failure.
                self.breaker.record_failure(source);
                tracing::warn!(%source, attempt, error = %error, "giving up");
                return (
                    SourceOutcome::Failed {
                        kind: error.kind(),
                        message: error.to_string(),
                    },
                    Vec::new(),
                );
            }

            let delay = match &error {
                SourceError::RateLimited { .. } => {
                    backoff::rate_limited_delay(&self.config.retry, attempt, &error)
                }
                _ => backoff::retry_delay(&self.config.retry, attempt),
            };
            tracing::debug!(%source, attempt, delay_ms = delay.as_millis() as u64, error = %error, "retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Circuit state and consecutive-failure count per source, for
    /// operational introspection.
    pub fn health_report(&self) -> Vec<(crate::types::SourceId, CircuitState, u32)> {
        self.breaker.health_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerPolicy, RetryPolicy, SourceSettings};
    use crate::types::{FailureKind, PubDate, SourceId};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted adapter: pops one response per call, repeating the last
    /// script entry once exhausted.
    struct ScriptedAdapter {
        source: SourceId,
        script: Mutex<VecDeque<Result<Vec<CandidateRecord>, SourceError>>>,
        last: Result<Vec<CandidateRecord>, SourceError>,
        calls: Arc<AtomicUsize>,
        delay: Option<Duration>,
    }

    impl ScriptedAdapter {
        fn new(
            source: SourceId,
            script: Vec<Result<Vec<CandidateRecord>, SourceError>>,
        ) -> (Box<dyn SourceAdapter>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let last = script
                .last()
                .cloned()
                .unwrap_or_else(|| Err(SourceError::Permanent("empty script".into())));
            let adapter = Box::new(Self {
                source,
                script: Mutex::new(script.into()),
                last,
                calls: Arc::clone(&calls),
                delay: None,
            });
            (adapter, calls)
        }

        fn slow(source: SourceId, delay: Duration) -> Box<dyn SourceAdapter> {
            Box::new(Self {
                source,
                script: Mutex::new(VecDeque::new()),
                last: Ok(vec![]),
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        fn source(&self) -> SourceId {
            self.source
        }

        async fn search(&self, _query: &Query) -> Result<Vec<CandidateRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.last.clone())
        }

        async fn fetch_full_text(
            &self,
            _identifier: &str,
        ) -> Result<Option<Vec<u8>>, SourceError> {
            Ok(None)
        }
    }

    fn record(source: SourceId, native_id: &str, title: &str) -> CandidateRecord {
        let mut external_ids = BTreeMap::new();
        external_ids.insert(source.id_key().to_string(), native_id.to_string());
        CandidateRecord {
            source,
            native_id: native_id.into(),
            title: title.into(),
            authors: vec![],
            published: Some(PubDate::year(2023)),
            abstract_text: String::new(),
            external_ids,
            full_text_available: false,
            venue: None,
            pdf_url: None,
            citation_count: None,
        }
    }

    fn config_for(sources: &[SourceId]) -> AcquireConfig {
        AcquireConfig {
            sources: sources.to_vec(),
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_secs(5),
            },
            ..Default::default()
        }
    }

    fn outcome_of(acquisition: &Acquisition, source: SourceId) -> &SourceOutcome {
        &acquisition
            .diagnostics
            .iter()
            .find(|d| d.source == source)
            .expect("diagnostic present")
            .outcome
    }

    #[tokio::test(start_paused = true)]
    async fn successful_fetch_produces_records_and_diagnostic() {
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::ArXiv,
            vec![Ok(vec![record(SourceId::ArXiv, "2301.00001", "A Paper")])],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::ArXiv]), vec![adapter]).unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(matches!(
            outcome_of(&result, SourceId::ArXiv),
            SourceOutcome::Fetched { count: 1 }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_is_served_from_cache() {
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::ArXiv,
            vec![Ok(vec![record(SourceId::ArXiv, "2301.00001", "A Paper")])],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::ArXiv]), vec![adapter]).unwrap();

        let query = Query::new(["paper"]);
        dispatcher.run(&query).await.unwrap();
        let second = dispatcher.run(&query).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            outcome_of(&second, SourceId::ArXiv),
            SourceOutcome::CacheHit { count: 1 }
        ));
        assert_eq!(second.records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_expiry_triggers_one_fresh_call() {
        let mut config = config_for(&[SourceId::ArXiv]);
        config.per_source.insert(
            SourceId::ArXiv,
            SourceSettings {
                cache_ttl: Duration::from_secs(60),
                ..Default::default()
            },
        );
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::ArXiv,
            vec![Ok(vec![record(SourceId::ArXiv, "2301.00001", "A Paper")])],
        );
        let dispatcher = Dispatcher::with_adapters(config, vec![adapter]).unwrap();

        let query = Query::new(["paper"]);
        dispatcher.run(&query).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        let after = dispatcher.run(&query).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            outcome_of(&after, SourceId::ArXiv),
            SourceOutcome::Fetched { .. }
        ));
    }

    /// Minimal alternative backing store: a plain map plus call counters.
    struct RecordingStore {
        entries: Mutex<std::collections::HashMap<(SourceId, String), Arc<Vec<CandidateRecord>>>>,
        gets: Arc<AtomicUsize>,
        puts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CacheStore for RecordingStore {
        async fn get(
            &self,
            source: SourceId,
            query_key: &str,
        ) -> Option<Arc<Vec<CandidateRecord>>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .get(&(source, query_key.to_string()))
                .cloned()
        }

        async fn put(
            &self,
            source: SourceId,
            query_key: String,
            records: Arc<Vec<CandidateRecord>>,
        ) {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().unwrap().insert((source, query_key), records);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_cache_store_is_interchangeable() {
        let gets = Arc::new(AtomicUsize::new(0));
        let puts = Arc::new(AtomicUsize::new(0));
        let store = RecordingStore {
            entries: Mutex::new(std::collections::HashMap::new()),
            gets: Arc::clone(&gets),
            puts: Arc::clone(&puts),
        };
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::ArXiv,
            vec![Ok(vec![record(SourceId::ArXiv, "2301.00001", "A Paper")])],
        );
        let dispatcher = Dispatcher::with_adapters(config_for(&[SourceId::ArXiv]), vec![adapter])
            .unwrap()
            .with_cache(Box::new(store));

        let query = Query::new(["paper"]);
        let first = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&first, SourceId::ArXiv),
            SourceOutcome::Fetched { count: 1 }
        ));
        assert_eq!(puts.load(Ordering::SeqCst), 1);

        let second = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&second, SourceId::ArXiv),
            SourceOutcome::CacheHit { count: 1 }
        ));
        assert_eq!(second.records.len(), 1);
        // The swapped-in store served the hit; the adapter was not asked
        // again and nothing new was written.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gets.load(Ordering::SeqCst), 2);
        assert_eq!(puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_then_succeed() {
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::Crossref,
            vec![
                Err(SourceError::Transient("reset".into())),
                Err(SourceError::Transient("reset".into())),
                Ok(vec![record(SourceId::Crossref, "10.1/x", "Recovered")]),
            ],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::Crossref]), vec![adapter]).unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.records.len(), 1);
        assert!(matches!(
            outcome_of(&result, SourceId::Crossref),
            SourceOutcome::Fetched { count: 1 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::Crossref,
            vec![Err(SourceError::Permanent("401".into()))],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::Crossref]), vec![adapter]).unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            outcome_of(&result, SourceId::Crossref),
            SourceOutcome::Failed {
                kind: FailureKind::Permanent,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn open_circuit_blocks_the_next_run_without_calls() {
        let mut config = config_for(&[SourceId::PubMed]);
        config.breaker = BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_secs(600),
        };
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::PubMed,
            vec![Err(SourceError::Transient("down".into()))],
        );
        let dispatcher = Dispatcher::with_adapters(config, vec![adapter]).unwrap();

        let query = Query::new(["paper"]);
        let first = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&first, SourceId::PubMed),
            SourceOutcome::Failed { .. }
        ));
        let calls_after_first = calls.load(Ordering::SeqCst);

        let second = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&second, SourceId::PubMed),
            SourceOutcome::CircuitOpen
        ));
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_counts_logical_calls_not_retry_attempts() {
        let mut config = config_for(&[SourceId::PubMed]);
        config.breaker = BreakerPolicy {
            failure_threshold: 5,
            cooldown: Duration::from_secs(600),
        };
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::PubMed,
            vec![Err(SourceError::Transient("down".into()))],
        );
        let dispatcher = Dispatcher::with_adapters(config, vec![adapter]).unwrap();

        // Each run exhausts max_attempts retries but records exactly one
        // failure, so four failed runs leave the circuit closed.
        let query = Query::new(["paper"]);
        for run in 0u32..4 {
            let result = dispatcher.run(&query).await.unwrap();
            assert!(matches!(
                outcome_of(&result, SourceId::PubMed),
                SourceOutcome::Failed { .. }
            ));
            let (_, state, failures) = dispatcher.health_report()[0];
            assert_eq!(state, CircuitState::Closed, "open after {} runs", run + 1);
            assert_eq!(failures, run + 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 12);

        // The fifth failed run reaches the threshold and trips it.
        dispatcher.run(&query).await.unwrap();
        assert_eq!(dispatcher.health_report()[0].1, CircuitState::Open);

        let blocked = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&blocked, SourceId::PubMed),
            SourceOutcome::CircuitOpen
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_admits_a_probe_that_recloses_the_circuit() {
        let mut config = config_for(&[SourceId::PubMed]);
        config.breaker = BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_secs(60),
        };
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::PubMed,
            vec![
                Err(SourceError::Transient("down".into())),
                Err(SourceError::Transient("down".into())),
                Err(SourceError::Transient("down".into())),
                Ok(vec![record(SourceId::PubMed, "42", "Back Up")]),
            ],
        );
        let dispatcher = Dispatcher::with_adapters(config, vec![adapter]).unwrap();

        // Exhaust all retries once; with threshold 1 that trips the
        // circuit.
        let query = Query::new(["paper"]);
        dispatcher.run(&query).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        tokio::time::sleep(Duration::from_secs(61)).await;

        let probe_run = dispatcher.run(&query).await.unwrap();
        assert!(matches!(
            outcome_of(&probe_run, SourceId::PubMed),
            SourceOutcome::Fetched { count: 1 }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            dispatcher.health_report()[0].1,
            CircuitState::Closed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_while_others_succeed() {
        let mut config = config_for(&[SourceId::ArXiv, SourceId::Crossref]);
        config.deadline = Duration::from_secs(45);
        let (ok_adapter, _) = ScriptedAdapter::new(
            SourceId::Crossref,
            vec![Ok(vec![record(SourceId::Crossref, "10.1/x", "Fast Paper")])],
        );
        let slow = ScriptedAdapter::slow(SourceId::ArXiv, Duration::from_secs(300));
        let dispatcher = Dispatcher::with_adapters(config, vec![slow, ok_adapter]).unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert!(matches!(
            outcome_of(&result, SourceId::ArXiv),
            SourceOutcome::TimedOut
        ));
        assert!(matches!(
            outcome_of(&result, SourceId::Crossref),
            SourceOutcome::Fetched { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_still_returns_ok_with_diagnostics() {
        let (a, _) = ScriptedAdapter::new(
            SourceId::ArXiv,
            vec![Err(SourceError::Permanent("400".into()))],
        );
        let (b, _) = ScriptedAdapter::new(
            SourceId::Crossref,
            vec![Err(SourceError::Permanent("403".into()))],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::ArXiv, SourceId::Crossref]), vec![a, b])
                .unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_retry_waits_at_least_the_hint() {
        let (adapter, calls) = ScriptedAdapter::new(
            SourceId::Crossref,
            vec![
                Err(SourceError::RateLimited {
                    retry_after: Some(Duration::from_secs(3)),
                }),
                Ok(vec![record(SourceId::Crossref, "10.1/x", "After Backoff")]),
            ],
        );
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::Crossref]), vec![adapter]).unwrap();

        let started = tokio::time::Instant::now();
        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(matches!(
            outcome_of(&result, SourceId::Crossref),
            SourceOutcome::Fetched { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_capped_at_max_results() {
        let records: Vec<_> = (0..10)
            .map(|i| record(SourceId::ArXiv, &format!("2301.0000{i}"), &format!("Paper {i}")))
            .collect();
        let (adapter, _) = ScriptedAdapter::new(SourceId::ArXiv, vec![Ok(records)]);
        let mut config = config_for(&[SourceId::ArXiv]);
        config.max_results = 4;
        let dispatcher = Dispatcher::with_adapters(config, vec![adapter]).unwrap();

        let result = dispatcher.run(&Query::new(["paper"])).await.unwrap();
        assert_eq!(result.records.len(), 4);
    }

    #[tokio::test]
    async fn malformed_query_is_rejected() {
        let (adapter, calls) = ScriptedAdapter::new(SourceId::ArXiv, vec![Ok(vec![])]);
        let dispatcher =
            Dispatcher::with_adapters(config_for(&[SourceId::ArXiv]), vec![adapter]).unwrap();

        let err = dispatcher
            .run(&Query::new(Vec::<String>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::InvalidQuery(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = AcquireConfig {
            sources: vec![],
            ..Default::default()
        };
        assert!(Dispatcher::with_adapters(config, vec![]).is_err());
    }
}
