//! Host integration points.
//!
//! A host application calls `on_content_render` on every piece of rendered
//! content and routes proxy requests to `on_proxy_request`. `CamoProxy` is the
//! one implementation; it is built from a validated config snapshot and
//! replaced wholesale on reload.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::camo::{CamoResult, ContentRewriter, LinkBuilder, Rewrite, Signer};
use crate::config::CamoConfig;
use crate::observability::metrics;
use crate::security::{Requester, RequesterPolicy};
use crate::serve::{Fallback, HttpFetcher, ImageFetcher, ImageResponse, ImageServer, ProxyQuery};

/// Callbacks the host invokes.
#[async_trait]
pub trait HostHooks: Send + Sync {
    /// Rewrite image sources in rendered content for `requester`.
    async fn on_content_render(&self, content: &str, requester: &Requester) -> String;

    /// Answer a proxy request. Always yields an image.
    async fn on_proxy_request(&self, query: &ProxyQuery, requester: &Requester) -> ImageResponse;
}

struct ActiveProxy {
    rewriter: ContentRewriter,
    server: ImageServer,
}

/// The camo proxy for one configuration snapshot.
pub struct CamoProxy {
    policy: RequesterPolicy,
    fallback: Fallback,
    active: Option<ActiveProxy>,
}

impl CamoProxy {
    /// Build the proxy with the `reqwest` fetcher.
    pub fn from_config(config: &CamoConfig) -> CamoResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.upstream)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Build the proxy with a custom image source.
    ///
    /// A disabled or unkeyed configuration yields an inactive proxy: content
    /// passes through and every proxy request gets the fallback image. An
    /// unreadable fallback image is an error either way.
    pub fn with_fetcher(config: &CamoConfig, fetcher: Arc<dyn ImageFetcher>) -> CamoResult<Self> {
        let settings = &config.camo;
        let fallback = Fallback::load(Path::new(&settings.fallback_image), settings.cache_hours)?;
        let policy = RequesterPolicy::from_config(&config.access);

        let active = if !settings.is_active() {
            if settings.enabled {
                tracing::warn!("No camo private key configured; proxy stays inactive");
            } else {
                tracing::info!("Camo proxy disabled by configuration");
            }
            None
        } else {
            let signer = Signer::new(settings)?;
            tracing::info!(
                base_url = %signer.base_url(),
                encoding = signer.encoding().as_str(),
                "Camo proxy active"
            );
            let server = ImageServer::new(
                signer.clone(),
                fetcher,
                fallback.clone(),
                settings.cache_hours,
            );
            Some(ActiveProxy {
                rewriter: ContentRewriter::new(LinkBuilder::new(signer)),
                server,
            })
        };

        Ok(Self {
            policy,
            fallback,
            active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Rewrite `content`, reporting how many images were proxied.
    pub fn render(&self, content: &str, requester: &Requester) -> Rewrite {
        let unchanged = || Rewrite {
            content: content.to_string(),
            images: 0,
        };

        let Some(active) = &self.active else {
            return unchanged();
        };
        if !self.policy.allows(requester) {
            tracing::debug!(group = ?requester.group, "Requester not allowed; content left as-is");
            return unchanged();
        }

        let rewrite = active.rewriter.rewrite(content);
        metrics::record_rewrite(rewrite.images);
        rewrite
    }

    /// Serve a proxy request and record its outcome.
    pub async fn serve(&self, query: &ProxyQuery, requester: &Requester) -> ImageResponse {
        let response = match &self.active {
            None => self.fallback.respond("disabled"),
            Some(_) if !self.policy.allows(requester) => {
                tracing::debug!(group = ?requester.group, "Requester not allowed; serving fallback");
                self.fallback.respond("forbidden")
            }
            Some(active) => active.server.serve(query).await,
        };
        metrics::record_request(response.outcome);
        response
    }
}

#[async_trait]
impl HostHooks for CamoProxy {
    async fn on_content_render(&self, content: &str, requester: &Requester) -> String {
        self.render(content, requester).content
    }

    async fn on_proxy_request(&self, query: &ProxyQuery, requester: &Requester) -> ImageResponse {
        self.serve(query, requester).await
    }
}
