use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Admissions allowed per key within one window.
    pub limit: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Admission rejected; carries the configured bounds for the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "Rate limit exceeded: max {limit} AI commands per {} seconds per board. Please wait.",
    .window.as_secs()
)]
pub struct RateLimitExceeded {
    pub limit: u32,
    pub window: Duration,
}

/// Per-key sliding-window admission gate.
///
/// Each key owns the timestamps of its admissions inside the trailing window.
/// The prune, count and record steps for one key run under that key's map
/// entry lock, so concurrent checks cannot over-admit.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request for `key`, recording it when admitted.
    pub fn admit(&self, key: &str) -> Result<(), RateLimitExceeded> {
        let now = Instant::now();
        let window = self.config.window;
        let mut bucket = self.buckets.entry(key.to_string()).or_default();

        // Timestamps are pushed in order, so stale ones sit at the front.
        while bucket
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            bucket.pop_front();
        }

        if bucket.len() >= self.config.limit as usize {
            debug!(key, in_window = bucket.len(), "admission rejected");
            return Err(RateLimitExceeded {
                limit: self.config.limit,
                window,
            });
        }

        bucket.push_back(now);
        Ok(())
    }

    /// Admissions still counted against `key` right now.
    pub fn in_window(&self, key: &str) -> usize {
        let now = Instant::now();
        self.buckets
            .get(key)
            .map(|b| {
                b.iter()
                    .filter(|t| now.duration_since(**t) < self.config.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Drop buckets whose admissions have all aged out. Returns how many
    /// keys were removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let window = self.config.window;
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.back().is_some_and(|t| now.duration_since(*t) < window));
        before.saturating_sub(self.buckets.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// Periodically sweep idle buckets so memory stays bounded by active keys.
pub fn start_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = limiter.prune_idle();
            if removed > 0 {
                info!(removed, remaining = limiter.tracked_keys(), "idle rate buckets swept");
            }
        }
    })
}
