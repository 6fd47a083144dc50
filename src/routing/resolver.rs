//! Path resolution onto the upstream `/v1` namespace.
//!
//! # Rules
//! - `""`, `/`, `/v1` and `/v1/` go to the default chat completions endpoint
//! - Paths already under `/v1/` are kept as-is
//! - Anything else is prefixed with `/v1` (adding a leading slash if missing)
//!
//! Nothing here validates the path; the upstream rejects what it doesn't know.

use std::fmt;

/// Version prefix of the upstream API.
pub const VERSION_PREFIX: &str = "/v1";

/// Endpoint assumed when the client doesn't name one.
pub const DEFAULT_ENDPOINT: &str = "/v1/chat/completions";

/// Map an inbound path onto the upstream `/v1/...` namespace.
pub fn resolve_path(path: &str) -> String {
    match path {
        "" | "/" | "/v1" | "/v1/" => DEFAULT_ENDPOINT.to_string(),
        p if p.starts_with("/v1/") => p.to_string(),
        p if p.starts_with('/') => format!("{VERSION_PREFIX}{p}"),
        p => format!("{VERSION_PREFIX}/{p}"),
    }
}

/// The resolved path with its leading `/v1` removed, ready to be appended to
/// a base URL that already ends in `/v1`.
pub fn upstream_suffix(path: &str) -> String {
    let resolved = resolve_path(path);
    match resolved.strip_prefix(VERSION_PREFIX) {
        Some(suffix) => suffix.to_string(),
        None => resolved,
    }
}

/// Fully resolved upstream URL for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    url: String,
}

impl UpstreamTarget {
    /// Build the target from the base URL, inbound path and raw query.
    ///
    /// The query is appended verbatim. An empty query adds no `?`.
    pub fn new(base_url: &str, path: &str, query: Option<&str>) -> Self {
        let base = base_url.trim_end_matches('/');
        let suffix = upstream_suffix(path);
        let url = match query {
            Some(q) if !q.is_empty() => format!("{base}{suffix}?{q}"),
            _ => format!("{base}{suffix}"),
        };
        Self { url }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
