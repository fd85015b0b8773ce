//! Denial decision metadata.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::spec::ResourceKind;

/// The metadata behind a rate-limit denial.
///
/// Constructed only when a check is denied, and immutable afterwards. The HTTP
/// boundary uses this to populate `X-RateLimit-*` and `Retry-After` headers;
/// the core itself never writes responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitDecision {
    /// The limiter key that denied the check
    pub key: String,
    /// What resource the exhausted limit meters
    pub kind: ResourceKind,
    /// Cost accumulated in the active window at denial time
    pub current: i64,
    /// The configured limit
    pub limit: i64,
    /// The cost the denied check requested
    pub requested: i64,
    /// Budget still available in the window, never negative
    pub remaining: i64,
    /// When the active window resets
    pub reset_time: DateTime<Utc>,
    /// How long the caller should wait before retrying
    #[serde(with = "retry_after_secs")]
    pub retry_after: Duration,
}

impl RateLimitDecision {
    /// The window reset time as Unix seconds, for `X-RateLimit-Reset`.
    pub fn reset_unix(&self) -> i64 {
        self.reset_time.timestamp()
    }
}

impl std::fmt::Display for RateLimitDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}/{} used, requested {}, retry after {}s",
            self.key,
            self.current,
            self.limit,
            self.requested,
            self.retry_after.as_secs()
        )
    }
}

/// Serialize `retry_after` as whole seconds to match the wire contract.
mod retry_after_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
