//! Acquisition configuration with sensible defaults.
//!
//! [`AcquireConfig`] controls which sources are queried, per-source
//! throughput and cache contracts, retry and circuit-breaker policy, and
//! the overall fan-out deadline. Defaults are tuned for polite use of the
//! public scholarly APIs.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::AcquireError;
use crate::types::SourceId;

/// Per-source throughput, caching and credential settings.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Maximum calls allowed to start within any rolling window.
    pub calls_per_window: u32,
    /// Length of the rolling rate-limit window.
    pub window: Duration,
    /// How long cached responses for this source stay valid.
    pub cache_ttl: Duration,
    /// Optional API key; sent the way the source expects it.
    pub api_key: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            calls_per_window: 60,
            window: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(3600),
            api_key: None,
        }
    }
}

/// Retry policy for transient source failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per source call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any computed backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Circuit-breaker policy applied independently per source.
#[derive(Debug, Clone)]
pub struct BreakerPolicy {
    /// Consecutive failures before the circuit trips open.
    pub failure_threshold: u32,
    /// Time spent open before a single probe call is allowed.
    pub cooldown: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Configuration for an acquisition run.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Which sources to query. Queried concurrently; results are merged.
    pub sources: Vec<SourceId>,
    /// Per-source settings; must contain an entry for every enabled source.
    pub per_source: BTreeMap<SourceId, SourceSettings>,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
    /// Circuit-breaker behaviour.
    pub breaker: BreakerPolicy,
    /// Overall deadline for the whole fan-out; sources still pending at
    /// the deadline are abandoned and reported as timed out.
    pub deadline: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Maximum number of canonical records returned after ranking.
    pub max_results: usize,
    /// Custom User-Agent string. If `None`, a default identifying the
    /// crate and its version is sent.
    pub user_agent: Option<String>,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        let mut per_source = BTreeMap::new();
        // arXiv asks automated clients to stay around one request per
        // three seconds.
        per_source.insert(
            SourceId::ArXiv,
            SourceSettings {
                calls_per_window: 20,
                window: Duration::from_secs(60),
                ..Default::default()
            },
        );
        // Unauthenticated Semantic Scholar budget is shared; stay modest.
        per_source.insert(
            SourceId::SemanticScholar,
            SourceSettings {
                calls_per_window: 30,
                window: Duration::from_secs(60),
                ..Default::default()
            },
        );
        // NCBI allows 3 req/s without a key.
        per_source.insert(
            SourceId::PubMed,
            SourceSettings {
                calls_per_window: 120,
                window: Duration::from_secs(60),
                ..Default::default()
            },
        );
        per_source.insert(SourceId::Crossref, SourceSettings::default());

        Self {
            sources: SourceId::all().to_vec(),
            per_source,
            retry: RetryPolicy::default(),
            breaker: BreakerPolicy::default(),
            deadline: Duration::from_secs(45),
            http_timeout: Duration::from_secs(30),
            max_results: 50,
            user_agent: None,
        }
    }
}

impl AcquireConfig {
    /// Settings for one source. Falls back to [`SourceSettings::default`]
    /// for sources the map does not mention.
    pub fn source_settings(&self, source: SourceId) -> SourceSettings {
        self.per_source.get(&source).cloned().unwrap_or_default()
    }

    /// Validates this configuration, returning an error if any field is
    /// invalid.
    pub fn validate(&self) -> Result<(), AcquireError> {
        if self.sources.is_empty() {
            return Err(AcquireError::Config(
                "at least one source must be enabled".into(),
            ));
        }
        let mut seen = self.sources.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.sources.len() {
            return Err(AcquireError::Config("duplicate source enabled".into()));
        }
        if self.max_results == 0 {
            return Err(AcquireError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.deadline.is_zero() {
            return Err(AcquireError::Config(
                "deadline must be greater than 0".into(),
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(AcquireError::Config(
                "http_timeout must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AcquireError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(AcquireError::Config(
                "retry.base_delay must be <= retry.max_delay".into(),
            ));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(AcquireError::Config(
                "breaker.failure_threshold must be at least 1".into(),
            ));
        }
        for source in &self.sources {
            let settings = self.source_settings(*source);
            if settings.calls_per_window == 0 {
                return Err(AcquireError::Config(format!(
                    "{source}: calls_per_window must be at least 1"
                )));
            }
            if settings.window.is_zero() {
                return Err(AcquireError::Config(format!(
                    "{source}: window must be greater than 0"
                )));
            }
        }
        Ok(())
    }
}
