//! Per-client token bucket rate limiting.
//!
//! Each client key owns one bucket, created on first sight and kept for the
//! life of the process. Buckets refill in whole batches at window boundaries
//! rather than continuously: a drained bucket stays empty until a full
//! window has passed, then receives `refill_tokens` at once.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};

/// Bucket sizing shared by every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub capacity: u32,
    pub refill_tokens: u32,
    pub refill_period: Duration,
}

impl RateLimitPolicy {
    pub fn new(capacity: u32, refill_tokens: u32, refill_period: Duration) -> Self {
        Self {
            capacity,
            refill_tokens,
            // A zero-length window would divide by zero in refill
            refill_period: refill_period.max(Duration::from_millis(1)),
        }
    }
}

impl Default for RateLimitPolicy {
    /// 100 requests, refilled as a batch of 100 every minute.
    fn default() -> Self {
        Self::new(100, 100, Duration::from_secs(60))
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity,
            config.refill_tokens,
            Duration::from_secs(config.refill_period_secs),
        )
    }
}

/// Token state for a single client key.
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Credit every whole window that elapsed since the last refill.
    fn refill(&mut self, policy: &RateLimitPolicy, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let windows = elapsed.as_nanos() / policy.refill_period.as_nanos();
        if windows == 0 {
            return;
        }

        let added = windows.saturating_mul(u128::from(policy.refill_tokens));
        let tokens = (u128::from(self.tokens) + added).min(u128::from(policy.capacity));
        self.tokens = u32::try_from(tokens).unwrap_or(policy.capacity);

        // Advance by whole windows only so partial progress toward the next
        // boundary is kept.
        let windows = u32::try_from(windows).unwrap_or(u32::MAX);
        self.last_refill = self
            .last_refill
            .checked_add(policy.refill_period.saturating_mul(windows))
            .unwrap_or(now);
    }

    fn try_acquire(&mut self, policy: &RateLimitPolicy, now: Instant) -> bool {
        self.refill(policy, now);

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Process-wide limiter keyed by client identity.
///
/// The map is sharded, and the shard lock is only held long enough to fetch
/// or create a bucket handle. Consumers of the same key then serialize on
/// that bucket's own mutex, so unrelated keys never wait on each other.
pub struct TokenBucketLimiter {
    buckets: DashMap<String, Arc<Mutex<TokenBucket>>>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl TokenBucketLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Take one token for `key`. Returns false, leaving the bucket untouched,
    /// when none is available.
    pub fn consume(&self, key: &str) -> bool {
        let bucket = self.bucket_for(key);
        let now = self.clock.now();
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(&self.policy, now)
    }

    /// Tokens currently available to `key`, or `None` for an unseen key.
    pub fn available(&self, key: &str) -> Option<u32> {
        let bucket = self.buckets.get(key).map(|b| Arc::clone(b.value()))?;
        let now = self.clock.now();
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.refill(&self.policy, now);
        Some(bucket.tokens)
    }

    /// Number of client keys seen so far.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_for(&self, key: &str) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self.buckets.get(key) {
            return Arc::clone(bucket.value());
        }

        let bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| {
                tracing::debug!(client = %key, "Allocating rate limit bucket");
                Arc::new(Mutex::new(TokenBucket::new(self.policy.capacity, self.clock.now())))
            })
            .value()
            .clone();
        metrics::record_bucket_count(self.buckets.len());
        bucket
    }
}

impl Default for TokenBucketLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
