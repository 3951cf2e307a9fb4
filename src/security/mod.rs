//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (requester group from X-Camo-Group)
//!     → RequesterPolicy decides: rewrite/serve, or pass content through
//!       unchanged / serve the fallback image
//! ```
//!
//! # Design Decisions
//! - Authentication is the host's job; it forwards the caller's group
//! - Fail closed: unknown or missing groups are denied unless -1 is allowed
//! - Denied image requests still get an image, never an error page

pub mod access_control;

pub use access_control::{Requester, RequesterPolicy, X_CAMO_GROUP};
