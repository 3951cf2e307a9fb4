//! Signed image proxy library.

pub mod camo;
pub mod config;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod serve;

pub use config::schema::CamoConfig;
pub use hooks::{CamoProxy, HostHooks};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
