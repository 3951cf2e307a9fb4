//! Image URL extraction from rendered content.

use regex::Regex;
use std::sync::LazyLock;

static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img src="([^"]*)""#).expect("Invalid regex"));

/// Returns every `<img src="...">` value in order of appearance.
/// Matching is case-insensitive and duplicates are kept.
pub fn extract_image_urls(content: &str) -> Vec<String> {
    IMG_SRC_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
        .collect()
}
