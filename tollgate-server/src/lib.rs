//! # Tollgate Server
//!
//! An HTTP front door that admits or rejects each request by client IP,
//! using a [`tollgate`] token bucket store.
//!
//! ## Purpose
//!
//! Every client gets its own bucket. A client that sends faster than the
//! refill rate drains its bucket and receives `429 Too Many Requests` until
//! tokens return; other clients are unaffected. Clients that go quiet are
//! forgotten after the idle expiry, so memory tracks recent clients only.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! tollgate --help
//!
//! # 20 req/s per client, burst 20, forget after 3 minutes (the defaults)
//! tollgate --port 8080
//!
//! # Behind a reverse proxy, 5 req/s with bursts of 10
//! tollgate --trust-proxy-headers --rate 5 --burst 10
//! ```
//!
//! ## Configuration
//!
//! Configure via config file, environment variables or CLI arguments (CLI
//! takes precedence over env, env over file):
//!
//! ```bash
//! # Via environment variables
//! export TOLLGATE_RATE=5
//! export TOLLGATE_PORT=9090
//! tollgate
//!
//! # List all available environment variables
//! tollgate --list-env-vars
//! ```
//!
//! ## Responses
//!
//! | Status | Body                                     | When                          |
//! |--------|------------------------------------------|-------------------------------|
//! | 200    | `{"status":"ok"}`                        | Request admitted              |
//! | 403    | `{"error":"Unable to identify client"}`  | No client IP could be found   |
//! | 429    | `{"error":"Rate limit exceeded"}`        | Client's bucket is empty      |
//! | 500    | `{"error":"Rate limiter error"}`         | The admission store failed    |
//!
//! ## Embedding
//!
//! Applications can put their own routes behind the same pipeline:
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use std::sync::Arc;
//! use tollgate::{BucketConfig, MemoryStore};
//! use tollgate_server::{AppState, app};
//!
//! let state = AppState::new(Arc::new(MemoryStore::new(BucketConfig::default())), false);
//! let routes = Router::new().route("/api/items", get(|| async { "items" }));
//! let app = app::protect(routes, state);
//! ```

pub mod app;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;

use metrics::Metrics;
use std::sync::Arc;
use tollgate::AdmissionStore;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AdmissionStore>,
    pub metrics: Arc<Metrics>,
    /// Identify clients by forwarding headers instead of the socket peer
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn AdmissionStore>, trust_proxy_headers: bool) -> Self {
        Self {
            store,
            metrics: Arc::new(Metrics::new()),
            trust_proxy_headers,
        }
    }
}
