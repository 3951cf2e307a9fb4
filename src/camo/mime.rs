//! Extension to MIME type mapping.

use std::path::Path;

/// Allowed image extensions. Anything else is served as the fallback image.
const ALLOWED_MIMES: [(&str, &str); 8] = [
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

/// Resolve the MIME type from a path's extension (case-insensitive).
/// Returns an empty string for unknown or missing extensions.
pub fn resolve_mime(path: &str) -> &'static str {
    let extension = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return "",
    };

    ALLOWED_MIMES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or("")
}
