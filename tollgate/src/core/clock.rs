//! Time sources for the admission store
//!
//! The store never calls `SystemTime::now()` directly. It asks a [`Clock`],
//! which lets tests drive time forward deterministically instead of sleeping.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// A source of the current time
///
/// Any `Fn() -> SystemTime` closure is a clock, so a one-off time source
/// does not need its own type:
///
/// ```
/// use tollgate::{BucketConfig, MemoryStore};
/// use std::time::{Duration, SystemTime, UNIX_EPOCH};
///
/// let fixed = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
/// let store = MemoryStore::with_clock(BucketConfig::default(), move || fixed);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time as seen by this clock
    fn now(&self) -> SystemTime;
}

impl<F> Clock for F
where
    F: Fn() -> SystemTime + Send + Sync,
{
    fn now(&self) -> SystemTime {
        self()
    }
}

/// Wall clock backed by [`SystemTime::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A manually driven clock
///
/// Clones share the same underlying instant, so a test can hand one clone to
/// a store and keep another to move time.
///
/// # Example
///
/// ```
/// use tollgate::ManualClock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// let start = clock.current();
///
/// handle.advance(Duration::from_millis(1500));
/// assert_eq!(clock.current(), start + Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current wall-clock time
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Creates a clock frozen at `start`
    pub fn starting_at(start: SystemTime) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Returns the instant the clock currently reads
    pub fn current(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Moves the clock backward by `by`, saturating at the Unix epoch
    pub fn rewind(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_sub(by).unwrap_or(SystemTime::UNIX_EPOCH);
    }

    /// Sets the clock to an absolute instant
    pub fn set(&self, to: SystemTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let start = UNIX_EPOCH + Duration::from_secs(1_000);
        let clock = ManualClock::starting_at(start);
        let handle = clock.clone();

        handle.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), start + Duration::from_secs(5));

        handle.rewind(Duration::from_secs(2));
        assert_eq!(clock.now(), start + Duration::from_secs(3));

        handle.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_manual_clock_rewind_saturates_at_epoch() {
        let clock = ManualClock::starting_at(UNIX_EPOCH + Duration::from_secs(1));
        clock.rewind(Duration::from_secs(10));
        assert_eq!(clock.now(), UNIX_EPOCH);
    }

    #[test]
    fn test_closure_is_a_clock() {
        let fixed = UNIX_EPOCH + Duration::from_secs(42);
        let clock = move || fixed;
        assert_eq!(Clock::now(&clock), fixed);
    }
}
