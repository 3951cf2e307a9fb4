//! Browser cache headers for served images.

use chrono::{DateTime, Duration, Utc};

/// RFC 7231 IMF-fixdate.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// `Cache-Control` and `Expires` values for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub cache_control: String,
    pub expires: String,
}

impl CacheHeaders {
    pub fn new(cache_hours: u32, now: DateTime<Utc>) -> Self {
        let max_age = u64::from(cache_hours) * 3600;
        let expires_at = now
            .checked_add_signed(Duration::hours(i64::from(cache_hours)))
            .unwrap_or(now);

        Self {
            cache_control: format!("public, max-age={max_age}"),
            expires: expires_at.format(HTTP_DATE_FORMAT).to_string(),
        }
    }

    pub fn now(cache_hours: u32) -> Self {
        Self::new(cache_hours, Utc::now())
    }
}
