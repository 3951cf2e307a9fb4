//! Digest signing and request verification.
//!
//! # Security
//! - The digest is HMAC-SHA256 over the proxy base URL, keyed with the
//!   private key; one digest authenticates the whole proxy channel
//! - The image parameter is exact-matched against a fresh encoding of the
//!   candidate locator, not signed on its own
//! - Digest comparison is constant-time
//! - The private key is never stored past construction and never logged

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::camo::codec::LocatorEncoding;
use crate::camo::types::{CamoError, CamoResult, ImageReference};
use crate::config::CamoSettings;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 digest of the proxy base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute `hex(HMAC-SHA256(key, base_url))`.
pub fn sign(base_url: &str, private_key: &[u8]) -> CamoResult<Digest> {
    let mut mac = HmacSha256::new_from_slice(private_key)
        .map_err(|e| CamoError::Configuration(format!("Invalid private key: {}", e)))?;
    mac.update(base_url.as_bytes());
    Ok(Digest(hex::encode(mac.finalize().into_bytes())))
}

/// Signs proxied links and verifies inbound proxy requests for one
/// configuration.
#[derive(Debug, Clone)]
pub struct Signer {
    base_url: String,
    digest: Digest,
    encoding: LocatorEncoding,
}

impl Signer {
    /// Build a signer from the camo settings.
    ///
    /// Fails with a configuration error when the base URL or the private
    /// key is empty.
    pub fn new(settings: &CamoSettings) -> CamoResult<Self> {
        if settings.base_url.is_empty() {
            return Err(CamoError::Configuration("Proxy base URL is not set".into()));
        }
        if settings.private_key.is_empty() {
            return Err(CamoError::Configuration("Proxy private key is not set".into()));
        }

        let digest = sign(&settings.base_url, settings.private_key.as_bytes())?;

        Ok(Self {
            base_url: settings.base_url.clone(),
            digest,
            encoding: settings.locator_encoding,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn encoding(&self) -> LocatorEncoding {
        self.encoding
    }

    /// Encode an image for the `image` query parameter.
    pub fn encode_image(&self, image: &ImageReference) -> String {
        self.encoding.encode(image.as_bytes())
    }

    /// Check a presented digest/image pair against a candidate locator.
    pub fn verify(&self, presented_digest: &str, presented_image: &str, candidate: &[u8]) -> bool {
        let digest_ok: bool = presented_digest
            .as_bytes()
            .ct_eq(self.digest.as_str().as_bytes())
            .into();
        let image_ok = presented_image == self.encoding.encode(candidate);

        digest_ok && image_ok
    }
}
