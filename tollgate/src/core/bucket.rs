//! Token bucket admission state
//!
//! A bucket holds up to `capacity` tokens and regains them continuously at
//! `refill_rate` tokens per second. Each admitted request takes one token.
//! Buckets start full, so the first `capacity` requests of a burst pass
//! immediately.

use super::BucketConfig;
use std::time::SystemTime;

/// Slack for rounding error accumulated over many small refills
const TOKEN_EPSILON: f64 = 1e-9;

/// Per-identifier token bucket
///
/// A plain value type: the caller supplies `now` on every call, which keeps
/// the algorithm deterministic and independent of any clock.
///
/// # Example
///
/// ```
/// use tollgate::TokenBucket;
/// use std::time::{Duration, SystemTime};
///
/// let start = SystemTime::now();
/// let mut bucket = TokenBucket::full(2, 1.0, start);
///
/// assert!(bucket.try_consume(start));
/// assert!(bucket.try_consume(start));
/// assert!(!bucket.try_consume(start));
///
/// // One second later a single token is back
/// assert!(bucket.try_consume(start + Duration::from_secs(1)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    tokens: f64,
    last_refill_at: SystemTime,
}

impl TokenBucket {
    /// Creates a bucket holding `capacity` tokens as of `now`
    pub fn full(capacity: u32, refill_rate: f64, now: SystemTime) -> Self {
        let capacity = f64::from(capacity);
        TokenBucket {
            capacity,
            refill_rate,
            tokens: capacity,
            last_refill_at: now,
        }
    }

    /// Creates a full bucket from the store-wide configuration
    pub fn from_config(config: &BucketConfig, now: SystemTime) -> Self {
        Self::full(config.burst_capacity(), config.refill_rate(), now)
    }

    /// Refills for the time elapsed since the last call, then tries to take
    /// one token
    ///
    /// Returns `true` when the request is admitted. A denied request leaves
    /// the (refilled) token count untouched.
    ///
    /// If `now` is earlier than the previous call (the clock stepped back),
    /// no tokens are added and the refill mark is not moved backwards, so a
    /// clock jump can never inflate the budget.
    pub fn try_consume(&mut self, now: SystemTime) -> bool {
        self.refill(now);

        if self.tokens + TOKEN_EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: SystemTime) {
        // Err means `now` precedes the last refill
        let Ok(elapsed) = now.duration_since(self.last_refill_at) else {
            return;
        };

        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill_at = now;
    }

    /// Tokens currently in the bucket, as of the last call
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// The instant tokens were last computed for
    pub fn last_refill_at(&self) -> SystemTime {
        self.last_refill_at
    }
}
