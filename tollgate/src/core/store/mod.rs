//! Admission stores
//!
//! [`AdmissionStore`] is the seam between the request pipeline and the
//! per-identifier state. [`MemoryStore`] is the in-process implementation.

use super::StoreError;
use std::sync::Arc;

mod memory;

pub use memory::{MemoryStore, SweepStats};

/// Point-in-time view of a store's occupancy, for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Identifiers currently holding state
    pub identifiers: usize,
    pub sweeps: SweepStats,
}


/// Answers "may this identifier proceed right now?"
///
/// Implementations must be safe to call from many threads at once and must
/// never admit more requests for an identifier than its bucket allows.
///
/// `Ok(false)` is a normal denial. `Err` is reserved for stores that can
/// fail (for example a networked backend timing out) and must be surfaced
/// to the caller rather than turned into an allow or a deny.
pub trait AdmissionStore: Send + Sync {
    /// Record one request for `identifier` and decide whether it is admitted
    fn allow(&self, identifier: &str) -> Result<bool, StoreError>;

    /// Occupancy figures, if the store can report them cheaply
    fn snapshot(&self) -> Option<StoreSnapshot> {
        None
    }
}

impl<S: AdmissionStore + ?Sized> AdmissionStore for Arc<S> {
    fn allow(&self, identifier: &str) -> Result<bool, StoreError> {
        (**self).allow(identifier)
    }

    fn snapshot(&self) -> Option<StoreSnapshot> {
        (**self).snapshot()
    }
}

impl<S: AdmissionStore + ?Sized> AdmissionStore for &S {
    fn allow(&self, identifier: &str) -> Result<bool, StoreError> {
        (**self).allow(identifier)
    }

    fn snapshot(&self) -> Option<StoreSnapshot> {
        (**self).snapshot()
    }
}
