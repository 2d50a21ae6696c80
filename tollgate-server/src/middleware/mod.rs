//! Request pipeline middleware
//!
//! - [`admission`]: asks the admission store whether the client may proceed
//! - [`request_log`]: one structured log line per request

pub mod admission;
pub mod request_log;

pub use admission::admission;
pub use request_log::request_log;

use axum::extract::{ConnectInfo, Request};
use std::net::SocketAddr;

/// Socket address of the connected peer, when the server records it
pub(crate) fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}
