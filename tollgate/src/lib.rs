//! # Tollgate
//!
//! A per-identifier token bucket admission store for Rust.
//!
//! ## Overview
//!
//! Tollgate keeps one token bucket per client identifier (typically an IP
//! address) and answers a single question: may this client proceed now?
//!
//! - **Bursts up front**: new clients start with a full bucket
//! - **Continuous refill**: tokens return at a fixed rate, capped at the burst size
//! - **Thread safe**: one store is shared by every request worker
//! - **Bounded memory**: idle clients are reclaimed without a background thread
//!
//! ## Quick Start
//!
//! ```
//! use tollgate::{AdmissionStore, BucketConfig, MemoryStore};
//!
//! // 20 requests per second with the default burst (20) and expiry (3 minutes)
//! let store = MemoryStore::new(BucketConfig::default());
//!
//! if store.allow("192.0.2.10")? {
//!     println!("Request allowed!");
//! } else {
//!     println!("Rate limited!");
//! }
//! # Ok::<(), tollgate::StoreError>(())
//! ```
//!
//! ## Configuration
//!
//! | Parameter        | Meaning                                  | Default        |
//! |------------------|------------------------------------------|----------------|
//! | `refill_rate`    | Tokens added per second                  | 20             |
//! | `burst_capacity` | Maximum tokens, i.e. largest burst       | `refill_rate`  |
//! | `idle_expiry`    | Inactivity before a client is forgotten  | 3 minutes      |
//!
//! Zero or invalid values resolve to these defaults when the
//! [`BucketConfig`] is built, never at request time.
//!
//! ```
//! use tollgate::BucketConfig;
//! use std::time::Duration;
//!
//! let config = BucketConfig::builder()
//!     .refill_rate(1.0)
//!     .burst_capacity(3)
//!     .idle_expiry(Duration::from_secs(60))
//!     .build();
//! ```
//!
//! ## Testing With Time
//!
//! Stores read time through a [`Clock`]. Tests can use [`ManualClock`] to
//! step time without sleeping:
//!
//! ```
//! use tollgate::{AdmissionStore, BucketConfig, ManualClock, MemoryStore};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let config = BucketConfig::builder().refill_rate(1.0).burst_capacity(1).build();
//! let store = MemoryStore::with_clock(config, clock.clone());
//!
//! assert!(store.allow("a").unwrap());
//! assert!(!store.allow("a").unwrap());
//!
//! clock.advance(Duration::from_secs(1));
//! assert!(store.allow("a").unwrap());
//! ```
//!
//! ## Thread Safety
//!
//! [`MemoryStore`] serializes every decision behind one mutex. Share it with
//! an [`Arc`](std::sync::Arc):
//!
//! ```
//! use std::sync::Arc;
//! use tollgate::{BucketConfig, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new(BucketConfig::default()));
//! ```
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for faster hashing

pub mod core;

pub use core::{
    AdmissionStore, BucketConfig, BucketConfigBuilder, Clock, DEFAULT_IDLE_EXPIRY,
    DEFAULT_REFILL_RATE, ManualClock, MemoryStore, StoreError, StoreSnapshot, SweepStats,
    SystemClock, TokenBucket,
};
