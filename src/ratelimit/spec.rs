//! Rate limit specifications.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FloodgateError, Result};

/// Upper bound on a limit window. Reset timestamps are wall-clock arithmetic,
/// so windows must stay well inside the representable range.
pub const MAX_WINDOW: Duration = Duration::from_secs(366 * 24 * 3600);

/// The kind of resource a limit meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Request count
    Requests,
    /// Model tokens (estimated or actual)
    Tokens,
    /// Payload bytes
    Bytes,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Requests => write!(f, "requests"),
            ResourceKind::Tokens => write!(f, "tokens"),
            ResourceKind::Bytes => write!(f, "bytes"),
        }
    }
}

/// Immutable configuration for one limiter key.
///
/// A spec is installed via [`RateLimiter::add_limit`](super::RateLimiter::add_limit)
/// and never mutated afterwards; replacing behavior means installing a new spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSpec {
    /// What resource this limit meters
    pub kind: ResourceKind,
    /// Maximum total cost admitted within one window
    pub limit: i64,
    /// Length of the counting window
    pub window: Duration,
    /// Optional burst ceiling for burst-aware policies. Must be at least
    /// `limit` when present; the fixed-window algorithm itself does not
    /// consult it.
    pub burst: Option<i64>,
}

impl RateLimitSpec {
    /// Create a new spec with no burst ceiling.
    pub fn new(kind: ResourceKind, limit: i64, window: Duration) -> Self {
        Self {
            kind,
            limit,
            window,
            burst: None,
        }
    }

    /// Set a burst ceiling.
    pub fn with_burst(mut self, burst: i64) -> Self {
        self.burst = Some(burst);
        self
    }

    /// Validate the spec for registration under `key`.
    ///
    /// Misconfiguration is rejected here rather than coerced to a default.
    pub(crate) fn validate(&self, key: &str) -> Result<()> {
        if self.limit < 1 {
            return Err(FloodgateError::InvalidSpec {
                key: key.to_string(),
                reason: format!("limit must be >= 1, got {}", self.limit),
            });
        }
        if self.window.is_zero() {
            return Err(FloodgateError::InvalidSpec {
                key: key.to_string(),
                reason: "window must be non-zero".to_string(),
            });
        }
        if self.window > MAX_WINDOW {
            return Err(FloodgateError::InvalidSpec {
                key: key.to_string(),
                reason: format!(
                    "window must be at most {} seconds, got {}",
                    MAX_WINDOW.as_secs(),
                    self.window.as_secs()
                ),
            });
        }
        if let Some(burst) = self.burst {
            if burst < self.limit {
                return Err(FloodgateError::InvalidSpec {
                    key: key.to_string(),
                    reason: format!("burst ceiling {} is below limit {}", burst, self.limit),
                });
            }
        }
        Ok(())
    }

    /// The window as a chrono duration for reset-time arithmetic.
    ///
    /// Infallible for validated specs; `window` is capped at [`MAX_WINDOW`].
    pub(crate) fn window_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX)
    }
}
