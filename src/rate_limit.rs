//! Per-source sliding-window rate limiting.
//!
//! Each source has an independent budget of N call starts per rolling
//! window W. [`RateLimiter::acquire`] suspends the caller until the
//! budget admits one more call; callers for the same source are served
//! FIFO, and callers for different sources never contend. A caller
//! cancelled while queued consumes no slot — a call start is only
//! recorded at the moment the permit is granted.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::AcquireConfig;
use crate::types::SourceId;

/// Sliding-window state for one source.
///
/// The [`Mutex`] doubles as the FIFO wait queue: a caller that must wait
/// holds the lock across its sleep, so later arrivals queue behind it in
/// lock-acquisition order (tokio's `Mutex` is fair).
struct SourceWindow {
    max_calls: usize,
    window: Duration,
    /// Start instants of granted calls inside the current window.
    starts: Mutex<VecDeque<Instant>>,
}

/// Per-source admission control bounding outbound call starts.
///
/// Built once from config at dispatcher construction; per-source state is
/// only ever touched under that source's own lock.
pub struct RateLimiter {
    windows: HashMap<SourceId, SourceWindow>,
}

impl RateLimiter {
    /// Create a limiter covering every source enabled in `config`.
    pub fn new(config: &AcquireConfig) -> Self {
        let windows = config
            .sources
            .iter()
            .map(|&source| {
                let settings = config.source_settings(source);
                (
                    source,
                    SourceWindow {
                        max_calls: settings.calls_per_window as usize,
                        window: settings.window,
                        starts: Mutex::new(VecDeque::new()),
                    },
                )
            })
            .collect();
        Self { windows }
    }

    /// Wait until `source`'s budget admits one more call, then record the
    /// call start.
    ///
    /// Never more than `calls_per_window` starts fall inside any
    /// window-length span. Unknown sources (not in config) are admitted
    /// immediately; the dispatcher only asks about configured sources.
    pub async fn acquire(&self, source: SourceId) {
        let Some(limit) = self.windows.get(&source) else {
            return;
        };

        let mut starts = limit.starts.lock().await;
        loop {
            let now = Instant::now();
            while starts
                .front()
                .is_some_and(|&t| now.duration_since(t) >= limit.window)
            {
                starts.pop_front();
            }

            if starts.len() < limit.max_calls {
                starts.push_back(now);
                return;
            }

            // Budget exhausted: sleep until the oldest start ages out.
            // The lock is held across the sleep so later callers for this
            // source queue FIFO behind us; other sources are unaffected.
            let oldest = match starts.front() {
                Some(&t) => t,
                None => continue,
            };
            tokio::time::sleep_until(oldest + limit.window).await;
        }
    }
}
