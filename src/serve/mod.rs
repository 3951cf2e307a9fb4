//! Proxy request serving.
//!
//! # Data Flow
//! ```text
//! GET {serve_path}?digest=..&image=..
//!     → headers.rs (Cache-Control / Expires, set on every branch)
//!     → camo::codec (decode image parameter)
//!     → camo::signer (verify digest and image)
//!     → camo::mime (extension allow-list)
//!     → upstream.rs (single bounded fetch)
//!     → ImageResponse: fetched bytes, or the fallback GIF
//! ```
//!
//! # Design Decisions
//! - Every branch answers 200 with an image body; failures only show up in
//!   logs and metrics
//! - The fallback bytes are read once at startup

pub mod headers;
pub mod upstream;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::camo::{CamoError, CamoResult, ImageReference, Signer};

pub use headers::CacheHeaders;
pub use upstream::{HttpFetcher, ImageFetcher};

/// Content type of the fallback image.
pub const FALLBACK_MIME: &str = "image/gif";

/// Query parameters of an inbound proxy request. Anything else in the query
/// (such as an `action` marker from the base URL) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    pub digest: Option<String>,
    pub image: Option<String>,
}

/// A fully decided image response.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub content_type: &'static str,
    pub cache: CacheHeaders,
    pub body: Bytes,
    /// Metric/log label for how the request ended.
    pub outcome: &'static str,
}

impl ImageResponse {
    pub fn is_fallback(&self) -> bool {
        self.outcome != "served"
    }
}

impl IntoResponse for ImageResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Ok(value) = HeaderValue::from_str(&self.cache.cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.cache.expires) {
            headers.insert(header::EXPIRES, value);
        }
        response
    }
}

/// The image served whenever a request cannot be honoured.
#[derive(Debug, Clone)]
pub struct Fallback {
    bytes: Bytes,
    cache_hours: u32,
}

impl Fallback {
    pub fn new(bytes: impl Into<Bytes>, cache_hours: u32) -> Self {
        Self {
            bytes: bytes.into(),
            cache_hours,
        }
    }

    pub fn load(path: &Path, cache_hours: u32) -> CamoResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            CamoError::Configuration(format!("fallback image {}: {e}", path.display()))
        })?;
        Ok(Self::new(bytes, cache_hours))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn respond(&self, outcome: &'static str) -> ImageResponse {
        ImageResponse {
            content_type: FALLBACK_MIME,
            cache: CacheHeaders::now(self.cache_hours),
            body: self.bytes.clone(),
            outcome,
        }
    }
}

/// Validates proxy requests and serves upstream images.
#[derive(Clone)]
pub struct ImageServer {
    signer: Signer,
    fetcher: Arc<dyn ImageFetcher>,
    fallback: Fallback,
    cache_hours: u32,
}

impl ImageServer {
    pub fn new(
        signer: Signer,
        fetcher: Arc<dyn ImageFetcher>,
        fallback: Fallback,
        cache_hours: u32,
    ) -> Self {
        Self {
            signer,
            fetcher,
            fallback,
            cache_hours,
        }
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    pub async fn serve(&self, query: &ProxyQuery) -> ImageResponse {
        let cache = CacheHeaders::now(self.cache_hours);

        match self.resolve(query).await {
            Ok((content_type, body)) => ImageResponse {
                content_type,
                cache,
                body,
                outcome: "served",
            },
            Err(e) => {
                match &e {
                    CamoError::Fetch(_) => tracing::warn!(error = %e, "Upstream image unavailable"),
                    _ => tracing::debug!(error = %e, "Proxy request rejected"),
                }
                let mut response = self.fallback.respond(e.outcome());
                response.cache = cache;
                response
            }
        }
    }

    async fn resolve(&self, query: &ProxyQuery) -> CamoResult<(&'static str, Bytes)> {
        let digest = query.digest.as_deref().unwrap_or_default();
        let image = query.image.as_deref().unwrap_or_default();

        let candidate = self.signer.encoding().decode(image)?;
        if !self.signer.verify(digest, image, &candidate) {
            return Err(CamoError::Validation);
        }

        let reference = ImageReference::from_bytes(candidate)?;
        let content_type = reference.mime_type();
        if content_type.is_empty() {
            return Err(CamoError::UnsupportedMime(reference.url().path().to_string()));
        }

        let body = self.fetcher.fetch(&reference).await?;
        tracing::debug!(image = %reference, content_type, bytes = body.len(), "Serving proxied image");
        Ok((content_type, body))
    }
}
