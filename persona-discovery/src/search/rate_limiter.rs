//! Per-source admission control
//!
//! Each adapter gets its own `governor` limiter built from the adapter's
//! `{requests, per}` quota. `acquire` waits until a cell is available; calls
//! are delayed, never rejected. Limiter state is atomic inside `governor`, so
//! concurrent callers against one source share the same budget safely.

use crate::types::RateLimit;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, trace};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiters for a fixed set of sources
#[derive(Default)]
pub struct SourceRateLimiter {
    limiters: HashMap<String, Arc<DirectLimiter>>,
}

impl SourceRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source quota
    ///
    /// `requests == 0` or a zero period means the source is not limited.
    pub fn register(&mut self, source_id: &str, limit: RateLimit) {
        match build_quota(limit) {
            Some(quota) => {
                debug!(
                    source_id = %source_id,
                    requests = limit.requests,
                    per_ms = limit.per.as_millis() as u64,
                    "Rate limit registered"
                );
                self.limiters
                    .insert(source_id.to_string(), Arc::new(RateLimiter::direct(quota)));
            }
            None => {
                self.limiters.remove(source_id);
            }
        }
    }

    pub fn is_limited(&self, source_id: &str) -> bool {
        self.limiters.contains_key(source_id)
    }

    /// Wait until `source_id` may be called
    pub async fn acquire(&self, source_id: &str) {
        if let Some(limiter) = self.limiters.get(source_id) {
            if limiter.check().is_err() {
                trace!(source_id = %source_id, "Waiting for rate limiter");
                limiter.until_ready().await;
            }
        }
    }
}

/// Spread `requests` evenly over `per`, allowing a full burst up front
fn build_quota(limit: RateLimit) -> Option<Quota> {
    let burst = NonZeroU32::new(limit.requests)?;
    let period = limit.per / limit.requests;
    Quota::with_period(period).map(|q| q.allow_burst(burst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_unlimited_sources_are_not_registered() {
        let mut limiter = SourceRateLimiter::new();
        limiter.register("wikipedia", RateLimit::unlimited());
        limiter.register("tmdb", RateLimit::new(40, Duration::from_secs(10)));

        assert!(!limiter.is_limited("wikipedia"));
        assert!(limiter.is_limited("tmdb"));
        assert!(!limiter.is_limited("unknown"));
    }

    #[tokio::test]
    async fn test_burst_then_delay() {
        let mut limiter = SourceRateLimiter::new();
        limiter.register("jikan", RateLimit::new(2, Duration::from_millis(200)));

        let start = Instant::now();
        limiter.acquire("jikan").await;
        limiter.acquire("jikan").await;
        assert!(start.elapsed() < Duration::from_millis(50), "burst should be immediate");

        // Third call waits for one cell to replenish (200ms / 2)
        limiter.acquire("jikan").await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_unregistered_source_never_waits() {
        let limiter = SourceRateLimiter::new();
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire("anything").await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
