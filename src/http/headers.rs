//! Header filtering between the two hops.
//!
//! End-to-end headers (including `Authorization` and `OpenAI-Organization`)
//! are forwarded untouched. Only headers that describe a single transport
//! connection are dropped, plus `Host` on the way out since the outbound
//! connection has its own authority.

use axum::http::{header, HeaderMap, HeaderName};

/// Headers that only apply to one connection (RFC 9110 §7.6.1).
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy `headers`, leaving out hop-by-hop headers and any header the
/// `Connection` header names.
pub fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers to send upstream for an inbound header set.
pub fn outbound(headers: &HeaderMap) -> HeaderMap {
    let mut out = end_to_end(headers);
    out.remove(header::HOST);
    out
}
