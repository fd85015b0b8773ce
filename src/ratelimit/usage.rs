//! Per-key usage state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counter state for a single limiter key within its active window.
///
/// The store owns the live instance; readers get clones so external code can
/// never race the store's writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageState {
    /// Total cost accumulated in the active window
    pub count: i64,
    /// When the active window ends and the counter rolls over
    pub reset_time: DateTime<Utc>,
    /// When this key last admitted a check
    pub last_used: DateTime<Utc>,
}

impl UsageState {
    /// Initialize a fresh window seeded with the first request's cost.
    pub(crate) fn new_window(cost: i64, now: DateTime<Utc>, window: chrono::Duration) -> Self {
        Self {
            count: cost,
            reset_time: now + window,
            last_used: now,
        }
    }

    /// Remaining budget under `limit`, never negative.
    pub fn remaining(&self, limit: i64) -> i64 {
        (limit - self.count).max(0)
    }

    /// Whether the active window has expired at `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_seeds_count_with_cost() {
        let now = Utc::now();
        let state = UsageState::new_window(7, now, chrono::Duration::seconds(60));
        assert_eq!(state.count, 7);
        assert_eq!(state.reset_time, now + chrono::Duration::seconds(60));
        assert_eq!(state.last_used, now);
    }

    #[test]
    fn test_remaining_is_never_negative() {
        let now = Utc::now();
        let state = UsageState::new_window(100, now, chrono::Duration::seconds(60));
        assert_eq!(state.remaining(5), 0);
        assert_eq!(state.remaining(150), 50);
    }

    #[test]
    fn test_expired() {
        let now = Utc::now();
        let state = UsageState::new_window(1, now, chrono::Duration::seconds(60));
        assert!(!state.expired(now));
        assert!(state.expired(now + chrono::Duration::seconds(60)));
        assert!(state.expired(now + chrono::Duration::seconds(61)));
    }
}
