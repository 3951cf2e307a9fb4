//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the camo
//! proxy. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::camo::codec::LocatorEncoding;

/// Root configuration for the camo proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CamoConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Signing, caching and fallback settings.
    pub camo: CamoSettings,

    /// Upstream image fetch limits.
    pub upstream: UpstreamConfig,

    /// Which requesters may use the rewrite and serve paths.
    pub access: AccessConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Proxy channel settings supplied by the host application.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CamoSettings {
    /// Master switch. The proxy also stays inactive while `private_key` is empty.
    pub enabled: bool,

    /// Base of every proxied URL, including its query marker
    /// (e.g., "https://forum.example/misc.php?action=camo").
    pub base_url: String,

    /// HMAC key. Prefer `CAMO_PRIVATE_KEY` over writing it to disk.
    #[serde(skip_serializing)]
    pub private_key: String,

    /// Browser cache lifetime for served images, in hours.
    pub cache_hours: u32,

    /// Image served whenever validation or fetch fails.
    pub fallback_image: String,

    /// Representation of the locator in the `image` parameter.
    pub locator_encoding: LocatorEncoding,

    /// Path the image endpoint is mounted on.
    pub serve_path: String,
}

impl CamoSettings {
    /// Enabled and keyed.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.private_key.is_empty()
    }
}

impl Default for CamoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8080/camo?action=camo".to_string(),
            private_key: String::new(),
            cache_hours: 4,
            fallback_image: "assets/fallback.gif".to_string(),
            locator_encoding: LocatorEncoding::Hex,
            serve_path: "/camo".to_string(),
        }
    }
}

impl std::fmt::Debug for CamoSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CamoSettings")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("private_key", &"<redacted>")
            .field("cache_hours", &self.cache_hours)
            .field("fallback_image", &self.fallback_image)
            .field("locator_encoding", &self.locator_encoding)
            .field("serve_path", &self.serve_path)
            .finish()
    }
}

/// Upstream fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum redirects followed per fetch.
    pub max_redirects: usize,

    /// Largest accepted image body in bytes.
    pub max_body_bytes: usize,

    /// User-Agent sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            user_agent: format!("camo-proxy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Requester authorization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Group ids allowed to use the proxy. `-1` allows everyone.
    pub allowed_groups: Vec<i64>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_groups: vec![-1],
        }
    }
}

/// Timeout configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CamoConfig::default();
        assert!(config.camo.enabled);
        assert!(!config.camo.is_active());
        assert_eq!(config.camo.cache_hours, 4);
        assert_eq!(config.camo.locator_encoding, LocatorEncoding::Hex);
        assert_eq!(config.upstream.max_redirects, 10);
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.access.allowed_groups, vec![-1]);
    }

    #[test]
    fn test_partial_toml() {
        let config: CamoConfig = toml::from_str(
            r#"
            [camo]
            base_url = "https://forum.example/misc.php?action=camo"
            private_key = "s3cret"
            locator_encoding = "base64url"

            [access]
            allowed_groups = [2, 4]
            "#,
        )
        .unwrap();

        assert!(config.camo.is_active());
        assert_eq!(config.camo.locator_encoding, LocatorEncoding::Base64url);
        assert_eq!(config.camo.cache_hours, 4);
        assert_eq!(config.access.allowed_groups, vec![2, 4]);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_private_key_never_rendered() {
        let mut settings = CamoSettings::default();
        settings.private_key = "s3cret".into();

        assert!(!format!("{:?}", settings).contains("s3cret"));
        let serialized = toml::to_string(&settings).unwrap();
        assert!(!serialized.contains("s3cret"));
    }
}
