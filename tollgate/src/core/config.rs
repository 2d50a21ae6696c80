//! Bucket parameters shared by every identifier in a store
//!
//! Misconfiguration is resolved here, once, at construction time: a zero,
//! negative or non-finite rate, a zero burst or a zero expiry falls back to
//! the documented default instead of failing individual requests later.

use std::time::Duration;

/// Refill rate used when none (or an invalid one) is configured
pub const DEFAULT_REFILL_RATE: f64 = 20.0;

/// Idle expiry used when none is configured
pub const DEFAULT_IDLE_EXPIRY: Duration = Duration::from_secs(3 * 60);

/// Process-wide token bucket parameters
///
/// - `refill_rate`: tokens added per second
/// - `burst_capacity`: maximum tokens a bucket holds, i.e. the largest burst
///   admitted with no delay between requests
/// - `idle_expiry`: how long an identifier may stay unused before its state
///   becomes eligible for reclamation
///
/// # Example
///
/// ```
/// use tollgate::BucketConfig;
/// use std::time::Duration;
///
/// // 5 requests per second, bursts of 10, forget clients after a minute
/// let config = BucketConfig::builder()
///     .refill_rate(5.0)
///     .burst_capacity(10)
///     .idle_expiry(Duration::from_secs(60))
///     .build();
///
/// assert_eq!(config.burst_capacity(), 10);
///
/// // Unset burst follows the rate
/// let config = BucketConfig::builder().refill_rate(7.6).build();
/// assert_eq!(config.burst_capacity(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    refill_rate: f64,
    burst_capacity: u32,
    idle_expiry: Duration,
}

impl BucketConfig {
    /// Resolves a configuration from raw values
    ///
    /// Pass `0` for any parameter to select its default.
    pub fn new(refill_rate: f64, burst_capacity: u32, idle_expiry: Duration) -> Self {
        let refill_rate = if refill_rate.is_finite() && refill_rate > 0.0 {
            refill_rate
        } else {
            DEFAULT_REFILL_RATE
        };

        let idle_expiry = if idle_expiry.is_zero() {
            DEFAULT_IDLE_EXPIRY
        } else {
            idle_expiry
        };

        let burst_capacity = if burst_capacity == 0 {
            burst_from_rate(refill_rate)
        } else {
            burst_capacity
        };

        BucketConfig {
            refill_rate,
            burst_capacity,
            idle_expiry,
        }
    }

    /// Creates a builder with every parameter unset
    pub fn builder() -> BucketConfigBuilder {
        BucketConfigBuilder::default()
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn burst_capacity(&self) -> u32 {
        self.burst_capacity
    }

    pub fn idle_expiry(&self) -> Duration {
        self.idle_expiry
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self::new(0.0, 0, Duration::ZERO)
    }
}

fn burst_from_rate(rate: f64) -> u32 {
    // Saturating float-to-int cast; very small rates still admit one request
    (rate.round() as u32).max(1)
}

/// Builder for [`BucketConfig`]
///
/// Unset parameters resolve to their defaults in [`build`](Self::build).
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketConfigBuilder {
    refill_rate: Option<f64>,
    burst_capacity: Option<u32>,
    idle_expiry: Option<Duration>,
}

impl BucketConfigBuilder {
    /// Set the number of tokens added per second
    pub fn refill_rate(mut self, rate: f64) -> Self {
        self.refill_rate = Some(rate);
        self
    }

    /// Set the maximum number of tokens a bucket can hold
    pub fn burst_capacity(mut self, burst: u32) -> Self {
        self.burst_capacity = Some(burst);
        self
    }

    /// Set how long an unused identifier is kept before reclamation
    pub fn idle_expiry(mut self, expiry: Duration) -> Self {
        self.idle_expiry = Some(expiry);
        self
    }

    /// Resolve defaults and build the configuration
    pub fn build(self) -> BucketConfig {
        BucketConfig::new(
            self.refill_rate.unwrap_or(0.0),
            self.burst_capacity.unwrap_or(0),
            self.idle_expiry.unwrap_or(Duration::ZERO),
        )
    }
}
