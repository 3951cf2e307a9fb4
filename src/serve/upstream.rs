//! Upstream image fetching.
//!
//! # Responsibilities
//! - One GET per proxied image, no retries
//! - Bounded total time, redirect count and body size
//! - Map every transport or protocol problem to `CamoError::Fetch`

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{redirect, Client};
use std::time::{Duration, Instant};

use crate::camo::{CamoError, CamoResult, ImageReference};
use crate::config::UpstreamConfig;
use crate::observability::metrics;

/// Source of image bytes for validated proxy requests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, image: &ImageReference) -> CamoResult<Bytes>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> CamoResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CamoError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn fetch_once(&self, image: &ImageReference) -> CamoResult<Bytes> {
        let mut response = self
            .client
            .get(image.url().clone())
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CamoError::Fetch(format!("upstream returned {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(CamoError::Fetch(format!(
                    "body of {len} bytes exceeds limit of {}",
                    self.max_body_bytes
                )));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(CamoError::Fetch(format!(
                    "body exceeds limit of {} bytes",
                    self.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(CamoError::Fetch("empty body".into()));
        }

        Ok(body.freeze())
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, image: &ImageReference) -> CamoResult<Bytes> {
        let start = Instant::now();
        let result = self.fetch_once(image).await;
        metrics::record_upstream(start.elapsed(), result.is_ok());
        result
    }
}

fn fetch_error(e: reqwest::Error) -> CamoError {
    if e.is_timeout() {
        CamoError::Fetch("timed out".into())
    } else if e.is_redirect() {
        CamoError::Fetch("too many redirects".into())
    } else {
        CamoError::Fetch(e.to_string())
    }
}
