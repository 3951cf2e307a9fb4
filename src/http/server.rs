//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router (proxy, render, health)
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve plain TCP or TLS on the given listener
//! - Swap in a rebuilt proxy when a reloaded config arrives
//!
//! # Design Decisions
//! - Handlers read one immutable snapshot per request via `ArcSwap`
//! - Routes and listener settings are fixed at startup; reload only swaps
//!   proxy behaviour

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, Request},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::camo::CamoResult;
use crate::config::{CamoConfig, TlsConfig};
use crate::hooks::{CamoProxy, HostHooks};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::Shutdown;
use crate::security::Requester;
use crate::serve::{ImageResponse, ProxyQuery};

/// Grace period for in-flight TLS connections on shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// One configuration and the proxy built from it.
pub struct ServerState {
    pub config: CamoConfig,
    pub proxy: CamoProxy,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<ArcSwap<ServerState>>,
}

impl AppState {
    pub fn new(config: CamoConfig, proxy: CamoProxy) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ServerState { config, proxy })),
        }
    }

    pub fn snapshot(&self) -> Arc<ServerState> {
        self.inner.load_full()
    }

    /// Rebuild the proxy from `config` and swap it in. On failure the
    /// current snapshot stays.
    pub fn reload(&self, config: CamoConfig) -> CamoResult<()> {
        let current = self.snapshot();
        if config.camo.serve_path != current.config.camo.serve_path
            || config.listener.bind_address != current.config.listener.bind_address
        {
            tracing::warn!("Listener and serve path changes take effect after a restart");
        }

        let proxy = CamoProxy::from_config(&config)?;
        tracing::info!(active = proxy.is_active(), "Configuration reloaded");
        self.inner.store(Arc::new(ServerState { config, proxy }));
        Ok(())
    }
}

/// Body of `POST /render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    pub content: String,
}

/// Response of `POST /render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub content: String,
    pub images: usize,
}

/// HTTP server for the camo proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: CamoConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: CamoConfig) -> CamoResult<Self> {
        let proxy = CamoProxy::from_config(&config)?;
        Ok(Self::with_proxy(config, proxy))
    }

    pub fn with_proxy(config: CamoConfig, proxy: CamoProxy) -> Self {
        let state = AppState::new(config.clone(), proxy);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &CamoConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        Router::new()
            .route(&config.camo.serve_path, get(proxy_handler))
            .route("/render", post(render_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(middleware)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<CamoConfig>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let state = self.state.clone();
        let mut reload_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            if let Err(e) = state.reload(config) {
                                tracing::error!(error = %e, "Reloaded config rejected, keeping current proxy");
                            }
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        match &self.config.listener.tls {
            Some(tls) => {
                let rustls = load_tls_config(tls).await?;
                tracing::info!(address = %addr, "HTTPS server starting");

                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                let stop = shutdown.notified();
                tokio::spawn(async move {
                    stop.await;
                    drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown.notified())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CamoConfig {
        &self.config
    }
}

/// Load TLS configuration from certificate and key files.
async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    for path in [&tls.cert_path, &tls.key_path] {
        if !Path::new(path).exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("TLS file not found: {path}"),
            ));
        }
    }
    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await
}

/// `GET {serve_path}`: always answers with an image.
async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> ImageResponse {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let requester = Requester::from_headers(&headers);
    let snapshot = state.snapshot();

    let response = snapshot.proxy.on_proxy_request(&query, &requester).await;
    tracing::debug!(
        outcome = response.outcome,
        content_type = response.content_type,
        "Proxy request handled"
    );
    response
}

/// `POST /render`: rewrite image sources in a content body.
async fn render_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RenderRequest>,
) -> Json<RenderResponse> {
    let requester = Requester::from_headers(&headers);
    let snapshot = state.snapshot();
    let rewrite = snapshot.proxy.render(&request.content, &requester);

    Json(RenderResponse {
        content: rewrite.content,
        images: rewrite.images,
    })
}

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "enabled": snapshot.proxy.is_active(),
    }))
}
