//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! serve / hooks / upstream produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is attached to every request span
//! - The private key never appears in logs
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
