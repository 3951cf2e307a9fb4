//! Image camouflage core.
//!
//! # Data Flow
//! ```text
//! Content render:
//!     rendered content
//!     → extractor.rs (find <img src="..."> values)
//!     → link.rs (signer.rs digest + codec.rs locator → proxied URL)
//!     → rewriter.rs (substitute every source with its proxied URL)
//!
//! Proxy request:
//!     digest + image query parameters
//!     → codec.rs (decode locator)
//!     → signer.rs (verify digest and image)
//!     → mime.rs (extension allow-list)
//!     → serve (fetch upstream or fall back)
//! ```
//!
//! # Design Decisions
//! - One digest per configuration, reused for every image
//! - Everything here is pure; network access lives in `serve`

pub mod codec;
pub mod extractor;
pub mod link;
pub mod mime;
pub mod rewriter;
pub mod signer;
pub mod types;

pub use codec::{DecodeError, LocatorEncoding};
pub use extractor::extract_image_urls;
pub use link::{LinkBuilder, ProxiedUrl};
pub use mime::resolve_mime;
pub use rewriter::{ContentRewriter, Rewrite};
pub use signer::{sign, Digest, Signer};
pub use types::{CamoError, CamoResult, ImageReference};
