//! Retry backoff computation.
//!
//! Exponential delays with jitter, kept as pure functions so the
//! dispatcher's sleep calls stay trivially testable.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryPolicy;
use crate::error::SourceError;

/// Delay before the retry following failed attempt `attempt` (0-based).
///
/// `base_delay * 2^attempt`, capped at `max_delay`, with ±25% uniform
/// jitter so concurrent retries against the same source spread out. The
/// jittered value is still clamped to `max_delay`.
pub(crate) fn retry_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = 2u32.saturating_pow(attempt.min(16));
    let raw = policy
        .base_delay
        .saturating_mul(exp)
        .min(policy.max_delay);
    jitter(raw).min(policy.max_delay)
}

/// Delay before retrying after explicit backpressure from the source.
///
/// The source's own `Retry-After` wins when it exceeds the computed
/// delay; with no hint the delay is pushed to at least half of
/// `max_delay`, well beyond the normal schedule. Either way the result
/// stays capped at `max_delay`.
pub(crate) fn rate_limited_delay(
    policy: &RetryPolicy,
    attempt: u32,
    error: &SourceError,
) -> Duration {
    let computed = retry_delay(policy, attempt);
    let floor = match error {
        SourceError::RateLimited {
            retry_after: Some(hint),
        } => *hint,
        _ => policy.max_delay / 2,
    };
    computed.max(floor).min(policy.max_delay)
}

/// Apply ±25% uniform jitter.
fn jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return delay;
    }
    let nanos = delay.as_nanos() as u64;
    let spread = nanos / 4;
    let low = nanos - spread;
    let high = nanos + spread;
    Duration::from_nanos(rand::thread_rng().gen_range(low..=high))
}
