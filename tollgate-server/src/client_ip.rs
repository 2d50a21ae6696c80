//! Client identification
//!
//! The admission store is keyed by client IP. Behind a reverse proxy the
//! socket peer is the proxy itself, so the forwarding headers can be trusted
//! instead; they are ignored unless explicitly enabled because any client
//! can set them.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Determine the identifier to rate limit a request by
///
/// With `trust_proxy_headers`, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Otherwise (or when neither header is usable) the
/// socket peer address is used. Returns `None` when nothing identifies the
/// client.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_for(headers).or_else(|| real_ip(headers)) {
            return Some(ip);
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    value
        .split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .map(str::to_owned)
}

fn real_ip(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_REAL_IP)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
