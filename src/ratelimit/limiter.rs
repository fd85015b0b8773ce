//! Core rate limiter implementation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{FloodgateError, Result};

use super::decision::RateLimitDecision;
use super::spec::RateLimitSpec;
use super::usage::UsageState;

/// How long an expired window's state is retained before the janitor may
/// evict it.
pub const DEFAULT_RETENTION_GRACE: Duration = Duration::from_secs(3600);

/// Maximum number of keys removed per write-lock acquisition during a sweep,
/// so cleanup never starves the request path.
const SWEEP_BATCH_SIZE: usize = 128;

/// The core rate limiter: fixed-window counters for opaque string keys.
///
/// This struct is thread-safe and can be shared across multiple tasks. Checks
/// are pure in-memory critical sections with no await points; all state for a
/// key is linearized by the usage-map lock.
///
/// Keys with no registered spec are admitted unconditionally (fail-open).
/// Callers that probe optional limits depend on this, so it is part of the
/// contract rather than a gap in it.
pub struct RateLimiter {
    /// Registered limit specs, read-mostly
    specs: RwLock<HashMap<String, RateLimitSpec>>,
    /// Live usage counters indexed by limiter key
    usage: RwLock<HashMap<String, UsageState>>,
    /// Retention grace applied by [`cleanup`](Self::cleanup)
    retention_grace: chrono::Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with the default retention grace.
    pub fn new() -> Self {
        Self::with_retention_grace(DEFAULT_RETENTION_GRACE)
    }

    /// Create a rate limiter with a custom retention grace for expired state.
    pub fn with_retention_grace(grace: Duration) -> Self {
        Self {
            specs: RwLock::new(HashMap::new()),
            usage: RwLock::new(HashMap::new()),
            retention_grace: chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Register or replace the limit spec for a key.
    ///
    /// Idempotent upsert. Replacing a spec does not reset the key's existing
    /// usage; only future window computations pick up the new limit and
    /// window. Invalid specs are rejected, never coerced.
    pub fn add_limit(&self, key: &str, spec: RateLimitSpec) -> Result<()> {
        spec.validate(key)?;

        let mut specs = self.specs.write();
        let replaced = specs.insert(key.to_string(), spec).is_some();
        if replaced {
            debug!(key = %key, "Replaced rate limit spec");
        } else {
            debug!(key = %key, "Registered rate limit spec");
        }
        Ok(())
    }

    /// Returns the registered spec for a key, if any.
    pub fn get_limit(&self, key: &str) -> Option<RateLimitSpec> {
        self.specs.read().get(key).cloned()
    }

    /// Check whether `cost` units may be admitted for `key`.
    ///
    /// Returns `Ok(())` on admission and a
    /// [`RateLimitExceeded`](FloodgateError::RateLimitExceeded) error carrying
    /// the full [`RateLimitDecision`] on denial. Denied checks do not consume
    /// budget.
    ///
    /// A fresh or expired window always admits and seeds the counter with
    /// `cost`, even when `cost` exceeds the limit. The first request through a
    /// window is never rejected; the overage is absorbed and the key is
    /// throttled for the remainder of the window.
    pub fn check(&self, key: &str, cost: i64) -> Result<()> {
        let spec = {
            let specs = self.specs.read();
            match specs.get(key) {
                Some(spec) => spec.clone(),
                None => {
                    trace!(key = %key, "No limit configured, admitting");
                    return Ok(());
                }
            }
        };

        let now = Utc::now();
        let mut usage = self.usage.write();

        match usage.get_mut(key) {
            None => {
                trace!(key = %key, cost = cost, "Opening window for new key");
                usage.insert(
                    key.to_string(),
                    UsageState::new_window(cost, now, spec.window_delta()),
                );
                Ok(())
            }
            Some(state) if state.expired(now) => {
                trace!(key = %key, cost = cost, "Window expired, rolling over");
                *state = UsageState::new_window(cost, now, spec.window_delta());
                Ok(())
            }
            Some(state) => {
                if state.count.saturating_add(cost) > spec.limit {
                    let decision = RateLimitDecision {
                        key: key.to_string(),
                        kind: spec.kind,
                        current: state.count,
                        limit: spec.limit,
                        requested: cost,
                        remaining: state.remaining(spec.limit),
                        reset_time: state.reset_time,
                        retry_after: (state.reset_time - now).to_std().unwrap_or(Duration::ZERO),
                    };
                    debug!(
                        key = %key,
                        current = state.count,
                        limit = spec.limit,
                        cost = cost,
                        "Rate limit exceeded"
                    );
                    return Err(FloodgateError::RateLimitExceeded(decision));
                }

                state.count += cost;
                state.last_used = now;
                Ok(())
            }
        }
    }

    /// Get a snapshot of the usage state for a key.
    pub fn get_usage(&self, key: &str) -> Option<UsageState> {
        self.usage.read().get(key).cloned()
    }

    /// Get a snapshot of all usage state.
    pub fn get_all_usage(&self) -> HashMap<String, UsageState> {
        self.usage.read().clone()
    }

    /// Discard the usage state for a key. The next check opens a fresh window.
    pub fn reset(&self, key: &str) {
        self.usage.write().remove(key);
    }

    /// Discard all usage state. Registered specs are untouched.
    pub fn reset_all(&self) {
        self.usage.write().clear();
    }

    /// Sweep out state whose window expired more than the retention grace ago.
    ///
    /// Returns the number of keys evicted. Also run periodically by the
    /// [`Janitor`](super::Janitor); a missed sweep only delays reclamation and
    /// never changes admission decisions.
    ///
    /// The write lock is held per delete batch rather than for the whole
    /// sweep, and each key's staleness is re-checked under the write lock so a
    /// concurrently refreshed window survives.
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();
        let stale: Vec<String> = {
            let usage = self.usage.read();
            usage
                .iter()
                .filter(|(_, state)| self.stale(state, now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        let mut evicted = 0;
        for batch in stale.chunks(SWEEP_BATCH_SIZE) {
            let mut usage = self.usage.write();
            for key in batch {
                if usage.get(key).is_some_and(|state| self.stale(state, now)) {
                    usage.remove(key);
                    evicted += 1;
                }
            }
        }

        if evicted > 0 {
            debug!(evicted = evicted, "Swept stale rate limit state");
        }
        evicted
    }

    /// Number of keys with live usage state.
    pub fn usage_count(&self) -> usize {
        self.usage.read().len()
    }

    fn stale(&self, state: &UsageState, now: DateTime<Utc>) -> bool {
        // checked_add: an out-of-range retention deadline means "never stale"
        state
            .reset_time
            .checked_add_signed(self.retention_grace)
            .is_some_and(|deadline| now > deadline)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
