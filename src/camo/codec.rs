//! Image locator encoding.
//!
//! # Responsibilities
//! - Percent-encode raw locators with the lenient RFC 3986 profile
//! - Render the percent-encoded bytes as lowercase hex or base64url
//! - Reverse the outer step for inbound proxy requests
//!
//! # Design Decisions
//! - Reserved characters stay literal so the encoded form is stable across
//!   hosts that re-escape them differently
//! - Link building and request decoding share one `LocatorEncoding`
//! - Inbound locators stay in percent-encoded form: encoding that form again
//!   yields the same string, so URLs already carrying escapes still verify

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

/// Escapes restored to their literal character after form-urlencoding.
/// Applied in order, one full pass per entry.
const RESERVED_ESCAPES: [(&str, &str); 19] = [
    ("%21", "!"),
    ("%2A", "*"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%3B", ";"),
    ("%3A", ":"),
    ("%40", "@"),
    ("%26", "&"),
    ("%3D", "="),
    ("%2B", "+"),
    ("%24", "$"),
    ("%2C", ","),
    ("%2F", "/"),
    ("%3F", "?"),
    ("%25", "%"),
    ("%23", "#"),
    ("%5B", "["),
    ("%5D", "]"),
];

/// Errors raised while decoding an inbound locator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("hex locator has odd length")]
    OddLength,

    #[error("invalid hex character {c:?} at index {index}")]
    InvalidHexCharacter { c: char, index: usize },

    #[error("invalid base64url locator: {0}")]
    InvalidBase64(String),

    #[error("locator is not valid UTF-8")]
    InvalidUtf8,

    #[error("locator is not an absolute URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported locator scheme: {0}")]
    UnsupportedScheme(String),
}

impl From<hex::FromHexError> for DecodeError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                DecodeError::InvalidHexCharacter { c, index }
            }
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                DecodeError::OddLength
            }
        }
    }
}

/// Percent-encodes `raw`, keeping the RFC 3986 reserved set literal.
pub fn percent_encode_locator(raw: &[u8]) -> String {
    let mut encoded: String = form_urlencoded::byte_serialize(raw).collect();
    for (escape, literal) in RESERVED_ESCAPES {
        if encoded.contains(escape) {
            encoded = encoded.replace(escape, literal);
        }
    }
    encoded
}

/// Lowercase hex of the percent-encoded locator.
pub fn encode_image_locator(raw: &[u8]) -> String {
    hex::encode(percent_encode_locator(raw))
}

/// Hex-decodes a locator back to its percent-encoded bytes.
pub fn decode_image_locator(hex: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(hex::decode(hex)?)
}

/// URL-safe base64 without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes URL-safe base64, padding the input up to the next multiple of 4.
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, DecodeError> {
    let padding = (4 - data.len() % 4) % 4;
    let mut padded = String::with_capacity(data.len() + padding);
    padded.push_str(data);
    padded.extend(std::iter::repeat('=').take(padding));

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Outer representation of the percent-encoded locator inside a proxied URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorEncoding {
    #[default]
    Hex,
    Base64url,
}

impl LocatorEncoding {
    /// Encodes a raw locator for use in the `image` query parameter.
    pub fn encode(&self, raw: &[u8]) -> String {
        match self {
            LocatorEncoding::Hex => encode_image_locator(raw),
            LocatorEncoding::Base64url => base64url_encode(percent_encode_locator(raw).as_bytes()),
        }
    }

    /// Decodes an `image` query parameter to the percent-encoded locator.
    pub fn decode(&self, value: &str) -> Result<Vec<u8>, DecodeError> {
        match self {
            LocatorEncoding::Hex => decode_image_locator(value),
            LocatorEncoding::Base64url => base64url_decode(value),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorEncoding::Hex => "hex",
            LocatorEncoding::Base64url => "base64url",
        }
    }
}
