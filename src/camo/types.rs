//! Core types and error definitions.

use thiserror::Error;
use url::Url;

use crate::camo::codec::DecodeError;
use crate::camo::mime;

/// Errors that can occur while building or serving proxied images.
#[derive(Debug, Error)]
pub enum CamoError {
    /// Malformed hex/base64 locator or a locator that is not a usable URL.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Digest or image parameter did not match the recomputed values.
    #[error("Signature validation failed")]
    Validation,

    /// Locator extension is not in the allowed image table.
    #[error("Unsupported image type: {0}")]
    UnsupportedMime(String),

    /// Upstream transport error, non-success status, empty or oversized body.
    #[error("Upstream fetch failed: {0}")]
    Fetch(String),

    /// Missing key or base URL, unreadable fallback image.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CamoError {
    /// Metric/log label for the request outcome this error leads to.
    pub fn outcome(&self) -> &'static str {
        match self {
            CamoError::Decode(_) | CamoError::Validation => "rejected",
            CamoError::UnsupportedMime(_) => "unsupported_mime",
            CamoError::Fetch(_) => "fetch_failed",
            CamoError::Configuration(_) => "disabled",
        }
    }
}

/// Result type for camo operations.
pub type CamoResult<T> = Result<T, CamoError>;

/// An upstream image URL, as found in content or recovered from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    raw: String,
    url: Url,
}

impl ImageReference {
    /// Parse an absolute http(s) URL. The raw text is kept byte-for-byte
    /// because it is what gets encoded into the proxied link.
    ///
    /// `Url::parse` silently drops surrounding whitespace and embedded tabs
    /// or newlines; text carrying them would sign a locator that no longer
    /// names the parsed URL, so it is rejected.
    pub fn parse(raw: impl Into<String>) -> CamoResult<Self> {
        let raw = raw.into();
        if raw.trim() != raw || raw.contains(['\t', '\n', '\r']) {
            return Err(DecodeError::InvalidUrl(format!("{raw:?}: surrounding or embedded whitespace")).into());
        }
        let url = Url::parse(&raw).map_err(|e| DecodeError::InvalidUrl(format!("{raw}: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(Self { raw, url }),
            other => Err(DecodeError::UnsupportedScheme(other.to_string()).into()),
        }
    }

    /// Build a reference from decoded locator bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> CamoResult<Self> {
        let raw = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        Self::parse(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// MIME type for the path extension, empty when not allowed.
    pub fn mime_type(&self) -> &'static str {
        mime::resolve_mime(self.url.path())
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
