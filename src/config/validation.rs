//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the proxy base URL can carry the `&digest=..&image=..` suffix
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CamoConfig → Result<(), Vec<ValidationError>>
//! - A missing private key is not an error; the proxy just stays inactive

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::CamoConfig;

/// Upper bound for `cache_hours` (ten years).
pub const MAX_CACHE_HOURS: u32 = 24 * 365 * 10;

/// Upper bound for `upstream.max_redirects`.
pub const MAX_REDIRECTS: usize = 50;

/// Paths the HTTP server mounts itself.
const RESERVED_PATHS: &[&str] = &["/render", "/health"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("camo.base_url: '{0}' is not an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("camo.base_url: '{0}' must contain a query string ('?') so parameters can be appended")]
    BaseUrlWithoutQuery(String),

    #[error("camo.serve_path: '{0}' must start with '/'")]
    InvalidServePath(String),

    #[error("camo.serve_path: '{0}' collides with a built-in endpoint")]
    ReservedServePath(String),

    #[error("camo.fallback_image must not be empty")]
    MissingFallbackImage,

    #[error("camo.cache_hours: {0} exceeds maximum of {max}", max = MAX_CACHE_HOURS)]
    CacheHoursTooLarge(u32),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("upstream.max_redirects: {0} exceeds maximum of {max}", max = MAX_REDIRECTS)]
    TooManyRedirects(usize),

    #[error("access.allowed_groups must not be empty (use -1 to allow everyone)")]
    NoAllowedGroups,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &CamoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let camo = &config.camo;
    match Url::parse(&camo.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.query().is_none() {
                errors.push(ValidationError::BaseUrlWithoutQuery(camo.base_url.clone()));
            }
        }
        _ => errors.push(ValidationError::InvalidBaseUrl(camo.base_url.clone())),
    }

    if !camo.serve_path.starts_with('/') {
        errors.push(ValidationError::InvalidServePath(camo.serve_path.clone()));
    } else if RESERVED_PATHS.contains(&camo.serve_path.as_str()) {
        errors.push(ValidationError::ReservedServePath(camo.serve_path.clone()));
    }

    if camo.fallback_image.trim().is_empty() {
        errors.push(ValidationError::MissingFallbackImage);
    }

    if camo.cache_hours > MAX_CACHE_HOURS {
        errors.push(ValidationError::CacheHoursTooLarge(camo.cache_hours));
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }

    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_body_bytes"));
    }

    if config.upstream.max_redirects > MAX_REDIRECTS {
        errors.push(ValidationError::TooManyRedirects(config.upstream.max_redirects));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.access.allowed_groups.is_empty() {
        errors.push(ValidationError::NoAllowedGroups);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
