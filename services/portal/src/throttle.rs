//! Fixed-window request throttling
//!
//! Bounds the rate of sensitive operations (login, signup, inquiry and
//! newsletter submissions) per key without external infrastructure. Keys are
//! caller-derived, by convention `<action>:<client-ip>`.
//!
//! The algorithm is a fixed window: the counter resets at window boundaries,
//! so a client can land up to 2x the limit across a boundary. That is an
//! accepted approximation. Entries live in process-local memory and are NOT
//! shared across instances; a horizontally scaled deployment gets a per-
//! instance limit, not a global one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use common::clock::Clock;

/// Limit parameters for one throttled action
#[derive(Debug, Clone, Copy)]
pub struct ThrottleOptions {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// How long until the window resets; 0 when allowed
    pub retry_after_ms: u64,
}

#[derive(Debug)]
struct ThrottleEntry {
    count: u32,
    reset_at_ms: i64,
}

/// Request throttle
#[derive(Clone)]
pub struct Throttle {
    entries: Arc<Mutex<HashMap<String, ThrottleEntry>>>,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    /// Create a new throttle with an empty entry map
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Record a request for `key` and decide whether it may proceed.
    ///
    /// The first observation of a key, and any observation at or past the
    /// entry's reset time, starts a fresh window with count 1.
    pub async fn check(&self, key: &str, options: ThrottleOptions) -> ThrottleDecision {
        let now_ms = self.clock.now().timestamp_millis();
        let mut entries = self.entries.lock().await;

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| ThrottleEntry {
                count: 0,
                reset_at_ms: now_ms + options.window_ms as i64,
            });

        // An expired entry reads as fresh whether or not the sweeper got to
        // it yet.
        if now_ms >= entry.reset_at_ms {
            entry.count = 0;
            entry.reset_at_ms = now_ms + options.window_ms as i64;
        }

        if entry.count >= options.max_requests {
            let retry_after_ms = (entry.reset_at_ms - now_ms).max(0) as u64;
            debug!("throttled key {} for another {}ms", key, retry_after_ms);
            return ThrottleDecision {
                allowed: false,
                remaining: 0,
                retry_after_ms,
            };
        }

        entry.count += 1;
        ThrottleDecision {
            allowed: true,
            remaining: options.max_requests - entry.count,
            retry_after_ms: 0,
        }
    }

    /// Drop entries whose window has passed. Garbage collection only:
    /// correctness never depends on when this runs.
    pub async fn sweep(&self) -> usize {
        let now_ms = self.clock.now().timestamp_millis();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at_ms > now_ms);
        before - entries.len()
    }

    /// Spawn a background task running [`sweep`](Self::sweep) on a fixed
    /// interval, bounding memory growth of the entry map.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let throttle = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = throttle.sweep().await;
                if removed > 0 {
                    debug!("throttle sweep removed {} expired entries", removed);
                }
            }
        })
    }

    #[cfg(test)]
    async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use common::clock::ManualClock;

    const LIMIT: ThrottleOptions = ThrottleOptions {
        max_requests: 5,
        window_ms: 60_000,
    };

    fn throttle_with_clock() -> (Throttle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (Throttle::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn allows_up_to_the_limit_then_denies() {
        let (throttle, _clock) = throttle_with_clock();

        for expected_remaining in (0..5).rev() {
            let decision = throttle.check("login:1.2.3.4", LIMIT).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            assert_eq!(decision.retry_after_ms, 0);
        }

        let denied = throttle.check("login:1.2.3.4", LIMIT).await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_ms, 60_000);
    }

    #[tokio::test]
    async fn retry_hint_shrinks_as_the_window_passes() {
        let (throttle, clock) = throttle_with_clock();

        for _ in 0..5 {
            throttle.check("login:1.2.3.4", LIMIT).await;
        }

        clock.advance(ChronoDuration::milliseconds(45_000));
        let denied = throttle.check("login:1.2.3.4", LIMIT).await;
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_ms, 15_000);
    }

    #[tokio::test]
    async fn window_rollover_starts_fresh() {
        let (throttle, clock) = throttle_with_clock();

        for _ in 0..5 {
            assert!(throttle.check("signup:5.6.7.8", LIMIT).await.allowed);
        }
        assert!(!throttle.check("signup:5.6.7.8", LIMIT).await.allowed);

        clock.advance(ChronoDuration::milliseconds(60_000));
        let decision = throttle.check("signup:5.6.7.8", LIMIT).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn boundary_burst_admits_twice_the_limit() {
        // Fixed-window property: 5 requests at the end of one window plus 5
        // at the start of the next all pass.
        let (throttle, clock) = throttle_with_clock();

        clock.advance(ChronoDuration::milliseconds(1));
        for _ in 0..5 {
            assert!(throttle.check("inquiry:9.9.9.9", LIMIT).await.allowed);
        }

        clock.advance(ChronoDuration::milliseconds(60_000));
        for _ in 0..5 {
            assert!(throttle.check("inquiry:9.9.9.9", LIMIT).await.allowed);
        }
        assert!(!throttle.check("inquiry:9.9.9.9", LIMIT).await.allowed);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_interfere() {
        let (throttle, _clock) = throttle_with_clock();

        for _ in 0..5 {
            assert!(throttle.check("login:1.1.1.1", LIMIT).await.allowed);
        }
        assert!(!throttle.check("login:1.1.1.1", LIMIT).await.allowed);

        let other = throttle.check("login:2.2.2.2", LIMIT).await;
        assert!(other.allowed);
        assert_eq!(other.remaining, 4);

        let other_action = throttle.check("signup:1.1.1.1", LIMIT).await;
        assert!(other_action.allowed);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let (throttle, clock) = throttle_with_clock();

        throttle.check("login:1.1.1.1", LIMIT).await;
        clock.advance(ChronoDuration::milliseconds(30_000));
        throttle.check("login:2.2.2.2", LIMIT).await;
        assert_eq!(throttle.entry_count().await, 2);

        // first key's window has passed, second is still open
        clock.advance(ChronoDuration::milliseconds(31_000));
        let removed = throttle.sweep().await;
        assert_eq!(removed, 1);
        assert_eq!(throttle.entry_count().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_fresh_even_before_sweep() {
        let (throttle, clock) = throttle_with_clock();

        for _ in 0..5 {
            throttle.check("login:1.2.3.4", LIMIT).await;
        }
        assert!(!throttle.check("login:1.2.3.4", LIMIT).await.allowed);

        // no sweep in between, the stale entry alone must not deny
        clock.advance(ChronoDuration::milliseconds(120_000));
        assert!(throttle.check("login:1.2.3.4", LIMIT).await.allowed);
    }
}
