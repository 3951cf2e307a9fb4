//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use camo_proxy::camo::{ImageReference, LinkBuilder, Signer};
use camo_proxy::config::CamoConfig;
use camo_proxy::http::HttpServer;
use camo_proxy::lifecycle::Shutdown;

pub const FALLBACK_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00fallback";

/// What a mock upstream answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub location: Option<String>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn ok(content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.to_vec(),
            location: None,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: b"nope".to_vec(),
            location: None,
            delay: Duration::ZERO,
        }
    }

    pub fn redirect(location: String) -> Self {
        Self {
            location: Some(location),
            ..Self::status(302)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Start a programmable upstream on an ephemeral port. `f` receives the
/// request path (with query).
pub async fn start_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head);
                let path = head
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();

                let response = f(path).await;
                tokio::time::sleep(response.delay).await;

                let mut out = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    reason(response.status),
                    response.content_type,
                    response.body.len()
                );
                if let Some(location) = &response.location {
                    out.push_str(&format!("Location: {location}\r\n"));
                }
                out.push_str("\r\n");

                let _ = socket.write_all(out.as_bytes()).await;
                let _ = socket.write_all(&response.body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Upstream that answers every request with `response`.
pub async fn start_static_upstream(response: MockResponse) -> SocketAddr {
    start_upstream(move |_| {
        let response = response.clone();
        async move { response }
    })
    .await
}

/// A fallback image on disk. Keep the handle alive for the test's duration.
pub fn fallback_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FALLBACK_GIF).unwrap();
    file
}

/// Keyed config pointing at `fallback`.
pub fn test_config(fallback: &tempfile::NamedTempFile) -> CamoConfig {
    let mut config = CamoConfig::default();
    config.camo.private_key = "integration-secret".into();
    config.camo.fallback_image = fallback.path().to_string_lossy().into_owned();
    config.upstream.timeout_secs = 1;
    config
}

/// Run the proxy on an ephemeral port. Triggering the returned `Shutdown`
/// stops it.
pub async fn start_proxy(mut config: CamoConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();
    config.camo.base_url = format!("http://{addr}/camo?action=camo");

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let (_tx, updates) = mpsc::unbounded_channel();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        let _tx = _tx;
        server.run(listener, updates, stop).await.unwrap();
    });

    (addr, shutdown)
}

/// Proxied URL for `image` under `config`, as a browser would request it.
pub fn proxied_url(config: &CamoConfig, proxy: SocketAddr, image: &str) -> String {
    let mut settings = config.camo.clone();
    settings.base_url = format!("http://{proxy}/camo?action=camo");
    let links = LinkBuilder::new(Signer::new(&settings).unwrap());
    links
        .build(&ImageReference::parse(image).unwrap())
        .into_string()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
