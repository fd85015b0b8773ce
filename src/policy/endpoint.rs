//! Per-endpoint request budgets with path normalization.

use std::sync::Arc;

use tracing::trace;

use crate::config::LimitRule;
use crate::error::Result;
use crate::ratelimit::{RateLimiter, ResourceKind};

/// Admission policy for inbound HTTP endpoints, keyed by normalized path.
pub struct EndpointPolicy {
    limiter: Arc<RateLimiter>,
}

impl EndpointPolicy {
    /// Create a policy over the shared limiter.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Register an endpoint budget. The configured path is normalized before
    /// registration so it matches normalized request paths.
    pub fn register(&self, path: &str, rule: &LimitRule) -> Result<()> {
        self.limiter
            .add_limit(&normalize_endpoint(path), rule.to_spec(ResourceKind::Requests))
    }

    /// Check whether one request to `path` may proceed.
    ///
    /// Paths with no registered budget are admitted (fail-open).
    pub fn check(&self, path: &str) -> Result<()> {
        let key = normalize_endpoint(path);
        trace!(path = %path, key = %key, "Checking endpoint budget");
        self.limiter.check(&key, 1)
    }
}

/// Normalize a request path into an endpoint bucket key.
///
/// The trailing slash is stripped, and versioned API paths are collapsed to
/// the first segment after the version prefix, so every resource under an API
/// collection shares one bucket:
/// `/api/v1/conversations/123/messages` -> `/api/v1/conversations`.
pub fn normalize_endpoint(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }

    for (i, segment) in segments.iter().enumerate() {
        if is_version_segment(segment) {
            let end = (i + 2).min(segments.len());
            return format!("/{}", segments[..end].join("/"));
        }
    }

    format!("/{}", segments.join("/"))
}

/// A version segment is "v" followed by digits, e.g. "v1" or "v2".
fn is_version_segment(segment: &str) -> bool {
    segment.len() >= 2
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}
