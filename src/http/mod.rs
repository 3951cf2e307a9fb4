//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → GET {serve_path} → hooks::CamoProxy::on_proxy_request
//!     → POST /render     → hooks::CamoProxy::on_content_render
//!     → GET /health
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer, RenderRequest, RenderResponse};
