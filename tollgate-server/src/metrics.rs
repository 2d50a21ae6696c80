//! Simple metrics collection for observability
//!
//! Lightweight atomic counters for admission outcomes, exported in
//! Prometheus text format. Store occupancy is read from the store at export
//! time rather than mirrored here.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tollgate::StoreSnapshot;

/// Outcome of one pass through the admission middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
    /// No client identifier could be determined
    Unidentified,
    /// The admission store returned an error
    Error,
}

/// Core metrics collected by the server
pub struct Metrics {
    /// Server start time
    start_time: Instant,

    /// Total requests that reached the admission middleware
    pub total_requests: AtomicU64,

    /// Admission outcomes
    pub requests_allowed: AtomicU64,
    pub requests_denied: AtomicU64,
    pub requests_unidentified: AtomicU64,
    pub requests_errors: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            requests_allowed: AtomicU64::new(0),
            requests_denied: AtomicU64::new(0),
            requests_unidentified: AtomicU64::new(0),
            requests_errors: AtomicU64::new(0),
        }
    }

    /// Record one admission outcome
    pub fn record(&self, decision: Decision) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let counter = match decision {
            Decision::Allowed => &self.requests_allowed,
            Decision::Denied => &self.requests_denied,
            Decision::Unidentified => &self.requests_unidentified,
            Decision::Error => &self.requests_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Percentage of identified requests that were denied
    pub fn denial_rate_percent(&self) -> f64 {
        let allowed = self.requests_allowed.load(Ordering::Relaxed);
        let denied = self.requests_denied.load(Ordering::Relaxed);
        let decided = allowed + denied;
        if decided == 0 {
            0.0
        } else {
            denied as f64 * 100.0 / decided as f64
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self, store: Option<StoreSnapshot>) -> String {
        let mut output = String::with_capacity(1024);

        metric(
            &mut output,
            "tollgate_uptime_seconds",
            "Time since server start in seconds",
            "gauge",
            self.uptime_seconds(),
        );
        metric(
            &mut output,
            "tollgate_requests_total",
            "Total number of requests checked for admission",
            "counter",
            self.total_requests.load(Ordering::Relaxed),
        );

        output.push_str("# HELP tollgate_decisions_total Admission decisions by outcome\n");
        output.push_str("# TYPE tollgate_decisions_total counter\n");
        for (outcome, counter) in [
            ("allowed", &self.requests_allowed),
            ("denied", &self.requests_denied),
            ("unidentified", &self.requests_unidentified),
            ("error", &self.requests_errors),
        ] {
            let _ = writeln!(
                output,
                "tollgate_decisions_total{{outcome=\"{outcome}\"}} {}",
                counter.load(Ordering::Relaxed)
            );
        }
        output.push('\n');

        output.push_str(
            "# HELP tollgate_denial_rate_percent Share of identified requests that were denied\n",
        );
        output.push_str("# TYPE tollgate_denial_rate_percent gauge\n");
        let _ = writeln!(
            output,
            "tollgate_denial_rate_percent {:.2}\n",
            self.denial_rate_percent()
        );

        // Store metrics
        if let Some(snapshot) = store {
            metric(
                &mut output,
                "tollgate_tracked_clients",
                "Client identifiers currently holding bucket state",
                "gauge",
                snapshot.identifiers,
            );
            metric(
                &mut output,
                "tollgate_sweeps_total",
                "Idle-client sweeps run",
                "counter",
                snapshot.sweeps.sweeps,
            );
            metric(
                &mut output,
                "tollgate_last_sweep_evicted",
                "Clients removed by the most recent sweep",
                "gauge",
                snapshot.sweeps.last_evicted,
            );
            metric(
                &mut output,
                "tollgate_evicted_total",
                "Clients removed across all sweeps",
                "counter",
                snapshot.sweeps.total_evicted,
            );
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn metric(output: &mut String, name: &str, help: &str, kind: &str, value: impl std::fmt::Display) {
    let _ = write!(
        output,
        "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n\n"
    );
}
