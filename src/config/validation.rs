//! Configuration validation.
//!
//! Serde handles the syntax; this module checks that values make sense
//! (addresses parse, the upstream URL is absolute http(s), origins are usable
//! header values). All problems are reported, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url {0:?} is not a valid URL: {1}")]
    BaseUrl(String, String),

    #[error("upstream.base_url {0:?} must use http or https")]
    BaseUrlScheme(String),

    #[error("upstream.connect_timeout_secs must be greater than zero")]
    ConnectTimeout,

    #[error("cors.allowed_origins entry {0:?} is not a valid header value")]
    Origin(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let base_url = &config.upstream.base_url;
    match Url::parse(base_url) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::BaseUrlScheme(base_url.clone()));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::BaseUrl(base_url.clone(), e.to_string())),
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ConnectTimeout);
    }

    for origin in &config.cors.allowed_origins {
        if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
