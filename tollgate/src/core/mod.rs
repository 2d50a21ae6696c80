//! Core components of the tollgate admission library
//!
//! This module contains the fundamental building blocks:
//! - [`config`]: Bucket parameters and their defaults
//! - [`clock`]: Injectable time sources
//! - [`bucket`]: The token bucket algorithm
//! - [`store`]: Per-identifier admission stores

pub mod bucket;
pub mod clock;
pub mod config;
pub mod store;

pub use bucket::TokenBucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BucketConfig, BucketConfigBuilder, DEFAULT_IDLE_EXPIRY, DEFAULT_REFILL_RATE};
pub use store::{AdmissionStore, MemoryStore, StoreSnapshot, SweepStats};

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors an admission store can report
///
/// A denied request is not an error; it is `Ok(false)`. These variants exist
/// for stores backed by something that can fail, so that "the limiter is
/// unavailable" stays distinguishable from "too many requests".
/// [`MemoryStore`] never returns them.
///
/// # Variants
///
/// - [`Backend`](StoreError::Backend): The backing store reported a failure
/// - [`Timeout`](StoreError::Timeout): The backing store did not answer in time
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store reported a failure
    Backend(String),
    /// The backing store did not answer within the given duration
    Timeout(Duration),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "backend error: {msg}"),
            StoreError::Timeout(after) => write!(f, "backend timed out after {after:?}"),
        }
    }
}

impl Error for StoreError {}
