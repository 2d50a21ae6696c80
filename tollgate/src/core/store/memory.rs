use super::{AdmissionStore, StoreSnapshot};
use crate::core::{BucketConfig, Clock, StoreError, SystemClock, TokenBucket};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

const DEFAULT_CAPACITY: usize = 1000;
const CAPACITY_OVERHEAD_FACTOR: f64 = 1.3;

/// In-memory admission store
///
/// Tracks one [`TokenBucket`] per identifier behind a single mutex. Every
/// call to [`allow`](AdmissionStore::allow) holds the lock for its whole
/// duration, so two callers can never both spend the last token of a bucket.
///
/// # Reclamation
///
/// There is no background timer. When a call observes that more than
/// `idle_expiry` has passed since the previous sweep, it sweeps the whole
/// map inline and drops every identifier unseen for longer than
/// `idle_expiry`. Sweeps therefore run at most once per `idle_expiry`, and
/// an idle identifier can linger for up to twice `idle_expiry` before it is
/// removed. A reclaimed identifier starts over with a full bucket.
///
/// # Example
///
/// ```
/// use tollgate::{AdmissionStore, BucketConfig, MemoryStore};
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new(
///     BucketConfig::builder().refill_rate(10.0).burst_capacity(2).build(),
/// ));
///
/// assert!(store.allow("203.0.113.7").unwrap());
/// assert!(store.allow("203.0.113.7").unwrap());
/// assert!(!store.allow("203.0.113.7").unwrap());
///
/// // Other clients are unaffected
/// assert!(store.allow("198.51.100.1").unwrap());
/// ```
pub struct MemoryStore<C: Clock = SystemClock> {
    config: BucketConfig,
    clock: C,
    state: Mutex<State>,
}

struct State {
    slots: HashMap<String, Slot>,
    last_sweep_at: SystemTime,
    stats: SweepStats,
}

struct Slot {
    bucket: TokenBucket,
    last_seen_at: SystemTime,
}

/// Counters describing the reclamation sweeps a store has run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Number of sweeps run since the store was created
    pub sweeps: u64,
    /// Identifiers removed by the most recent sweep
    pub last_evicted: usize,
    /// Identifiers removed across all sweeps
    pub total_evicted: u64,
}

impl MemoryStore<SystemClock> {
    /// Create a store that reads the system clock
    pub fn new(config: BucketConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a store that reads the system clock, pre-sized for `capacity`
    /// identifiers
    pub fn with_capacity(config: BucketConfig, capacity: usize) -> Self {
        Self::with_clock_and_capacity(config, SystemClock, capacity)
    }
}

impl<C: Clock> MemoryStore<C> {
    /// Create a store reading time from `clock`
    pub fn with_clock(config: BucketConfig, clock: C) -> Self {
        Self::with_clock_and_capacity(config, clock, DEFAULT_CAPACITY)
    }

    /// Create a store reading time from `clock`, pre-sized for `capacity`
    /// identifiers
    ///
    /// The map is allocated 30% larger than `capacity` to reduce rehashing.
    pub fn with_clock_and_capacity(config: BucketConfig, clock: C, capacity: usize) -> Self {
        let last_sweep_at = clock.now();
        MemoryStore {
            config,
            clock,
            state: Mutex::new(State {
                slots: HashMap::with_capacity(
                    (capacity as f64 * CAPACITY_OVERHEAD_FACTOR) as usize,
                ),
                last_sweep_at,
                stats: SweepStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Number of identifiers currently tracked, including idle ones not yet
    /// swept
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    /// Whether state is currently held for `identifier`
    pub fn contains(&self, identifier: &str) -> bool {
        self.lock().slots.contains_key(identifier)
    }

    pub fn sweep_stats(&self) -> SweepStats {
        self.lock().stats
    }

    // State is consistent between calls, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn admit(&mut self, identifier: &str, config: &BucketConfig, now: SystemTime) -> bool {
        if let Some(slot) = self.slots.get_mut(identifier) {
            slot.last_seen_at = now;
            return slot.bucket.try_consume(now);
        }

        // Only first sightings pay for the key allocation
        let mut bucket = TokenBucket::from_config(config, now);
        let allowed = bucket.try_consume(now);
        self.slots.insert(
            identifier.to_owned(),
            Slot {
                bucket,
                last_seen_at: now,
            },
        );
        allowed
    }

    fn sweep_due(&self, idle_expiry: Duration, now: SystemTime) -> bool {
        elapsed(self.last_sweep_at, now) > idle_expiry
    }

    fn sweep(&mut self, idle_expiry: Duration, now: SystemTime) {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| elapsed(slot.last_seen_at, now) <= idle_expiry);
        let evicted = before - self.slots.len();

        self.last_sweep_at = now;
        self.stats.sweeps += 1;
        self.stats.last_evicted = evicted;
        self.stats.total_evicted += evicted as u64;
    }
}

/// Time from `earlier` to `now`, zero if the clock has stepped back
fn elapsed(earlier: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(earlier).unwrap_or(Duration::ZERO)
}

impl<C: Clock> AdmissionStore for MemoryStore<C> {
    fn allow(&self, identifier: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let now = self.clock.now();

        // The caller's own slot was just touched, so it always survives a
        // sweep triggered here.
        let allowed = state.admit(identifier, &self.config, now);

        let idle_expiry = self.config.idle_expiry();
        if state.sweep_due(idle_expiry, now) {
            state.sweep(idle_expiry, now);
        }

        Ok(allowed)
    }

    fn snapshot(&self) -> Option<StoreSnapshot> {
        let state = self.lock();
        Some(StoreSnapshot {
            identifiers: state.slots.len(),
            sweeps: state.stats,
        })
    }
}

impl<C: Clock> std::fmt::Debug for MemoryStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
