//! Admission backend trait for abstracting over limiter implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::limiter::RateLimiter;
use super::usage::UsageState;

/// Trait for admission-control backends.
///
/// This trait abstracts the local [`RateLimiter`] so an alternate backend
/// (e.g. a distributed counter store) can sit behind the same check contract.
/// Any such backend must keep the fail-open policy: on backend failure or
/// missing configuration, admit rather than deny.
#[async_trait]
pub trait AdmissionBackend: Send + Sync {
    /// Check whether `cost` units may be admitted for `key`.
    async fn check(&self, key: &str, cost: i64) -> Result<()>;

    /// Get a snapshot of the usage state for a key.
    async fn usage(&self, key: &str) -> Option<UsageState>;
}

#[async_trait]
impl AdmissionBackend for RateLimiter {
    async fn check(&self, key: &str, cost: i64) -> Result<()> {
        RateLimiter::check(self, key, cost)
    }

    async fn usage(&self, key: &str) -> Option<UsageState> {
        self.get_usage(key)
    }
}
