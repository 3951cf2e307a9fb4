//! Requester authorization.
//! Decides whether the current caller may use the rewrite and serve paths.

use axum::http::HeaderMap;
use std::collections::HashSet;

use crate::config::AccessConfig;

/// Header the host sets to the requesting user's group id.
pub const X_CAMO_GROUP: &str = "x-camo-group";

/// Group id that allows every requester, including anonymous ones.
pub const ALL_GROUPS: i64 = -1;

/// The caller on whose behalf content is rendered or an image is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requester {
    pub group: Option<i64>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self { group: None }
    }

    pub fn in_group(group: i64) -> Self {
        Self { group: Some(group) }
    }

    /// Read the group from `X-Camo-Group`. Missing or malformed values are
    /// treated as anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let group = headers
            .get(X_CAMO_GROUP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        Self { group }
    }
}

/// Allow-list of requester groups.
#[derive(Debug, Clone)]
pub struct RequesterPolicy {
    allow_all: bool,
    groups: HashSet<i64>,
}

impl RequesterPolicy {
    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            allow_all: config.allowed_groups.contains(&ALL_GROUPS),
            groups: config.allowed_groups.iter().copied().collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            groups: HashSet::new(),
        }
    }

    pub fn allows(&self, requester: &Requester) -> bool {
        if self.allow_all {
            return true;
        }
        requester
            .group
            .map(|g| self.groups.contains(&g))
            .unwrap_or(false)
    }
}
