//! HTTP boundary adapter.
//!
//! The core never writes HTTP responses. This module renders limiter output
//! into the standard rate-limit headers and the JSON body the middleware
//! layer returns with a 429; routing and identity extraction stay with the
//! caller.

use serde::Serialize;

use crate::ratelimit::{RateLimitDecision, UsageState};

pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RESET: &str = "X-RateLimit-Reset";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Header name/value pairs for a denied request.
///
/// `X-RateLimit-Reset` carries Unix seconds; `Retry-After` carries whole
/// seconds until the window resets.
pub fn denial_headers(decision: &RateLimitDecision) -> Vec<(&'static str, String)> {
    vec![
        (HEADER_LIMIT, decision.limit.to_string()),
        (HEADER_REMAINING, decision.remaining.to_string()),
        (HEADER_RESET, decision.reset_unix().to_string()),
        (
            HEADER_RETRY_AFTER,
            decision.retry_after.as_secs().to_string(),
        ),
    ]
}

/// Informational headers for an admitted request, populated from a usage
/// snapshot and the key's configured limit.
pub fn usage_headers(usage: &UsageState, limit: i64) -> Vec<(&'static str, String)> {
    vec![
        (HEADER_LIMIT, limit.to_string()),
        (HEADER_REMAINING, usage.remaining(limit).to_string()),
        (HEADER_RESET, usage.reset_time.timestamp().to_string()),
    ]
}

/// JSON body of a 429 response.
#[derive(Debug, Clone, Serialize)]
pub struct DenialBody {
    pub error: &'static str,
    pub message: String,
    pub retry_after: u64,
    pub reset_time: i64,
}

impl From<&RateLimitDecision> for DenialBody {
    fn from(decision: &RateLimitDecision) -> Self {
        Self {
            error: "rate_limit_exceeded",
            message: format!("Rate limit exceeded: {}", decision),
            retry_after: decision.retry_after.as_secs(),
            reset_time: decision.reset_unix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::DateTime;

    use super::*;
    use crate::ratelimit::ResourceKind;

    fn decision() -> RateLimitDecision {
        RateLimitDecision {
            key: "claude:requests".to_string(),
            kind: ResourceKind::Requests,
            current: 5,
            limit: 5,
            requested: 1,
            remaining: 0,
            reset_time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            retry_after: Duration::from_secs(42),
        }
    }

    #[test]
    fn test_denial_headers() {
        let headers = denial_headers(&decision());
        assert_eq!(
            headers,
            vec![
                (HEADER_LIMIT, "5".to_string()),
                (HEADER_REMAINING, "0".to_string()),
                (HEADER_RESET, "1700000000".to_string()),
                (HEADER_RETRY_AFTER, "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_usage_headers() {
        let now = chrono::Utc::now();
        let usage = UsageState {
            count: 3,
            reset_time: now,
            last_used: now,
        };
        let headers = usage_headers(&usage, 10);
        assert_eq!(headers[0], (HEADER_LIMIT, "10".to_string()));
        assert_eq!(headers[1], (HEADER_REMAINING, "7".to_string()));
        assert_eq!(headers[2], (HEADER_RESET, now.timestamp().to_string()));
    }

    #[test]
    fn test_denial_body_json() {
        let body = DenialBody::from(&decision());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"], "rate_limit_exceeded");
        assert_eq!(json["retry_after"], 42);
        assert_eq!(json["reset_time"], 1_700_000_000i64);
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("claude:requests"));
    }
}
