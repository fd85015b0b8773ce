//! Per-API-key tier budgets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::config::TierBudget;
use crate::error::Result;
use crate::ratelimit::{RateLimitSpec, RateLimiter, ResourceKind};

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86400);

/// Admission policy for API keys, bucketed by tier.
///
/// The caller resolves a key's tier (an API-key lookup collaborator) before
/// the check; this policy maps the tier name to its budgets and meters each
/// key individually: requests per hour and tokens per day.
pub struct ApiKeyPolicy {
    limiter: Arc<RateLimiter>,
    tiers: HashMap<String, TierBudget>,
}

impl ApiKeyPolicy {
    /// Create a policy over the shared limiter with the given tier table.
    pub fn new(limiter: Arc<RateLimiter>, tiers: HashMap<String, TierBudget>) -> Self {
        Self { limiter, tiers }
    }

    /// Check whether one request from `api_key` (already resolved to `tier`)
    /// may proceed, consuming `estimated_tokens` from the daily token budget.
    ///
    /// Specs for the key are installed lazily on first use and refreshed when
    /// the tier's budgets change; in-flight counts survive a tier change. A
    /// tier name missing from the table behaves like an unconfigured key:
    /// fail-open, same as the limiter's contract for unregistered keys.
    pub fn check(&self, api_key: &str, tier: &str, estimated_tokens: i64) -> Result<()> {
        let Some(budget) = self.tiers.get(tier) else {
            trace!(tier = %tier, "Unknown tier, admitting");
            return Ok(());
        };

        let requests_key = format!("apikey:{}:requests", api_key);
        let tokens_key = format!("apikey:{}:tokens", api_key);

        self.ensure_limit(
            &requests_key,
            RateLimitSpec::new(ResourceKind::Requests, budget.requests_per_hour, HOUR),
        )?;
        self.ensure_limit(
            &tokens_key,
            RateLimitSpec::new(ResourceKind::Tokens, budget.tokens_per_day, DAY),
        )?;

        self.limiter.check(&requests_key, 1)?;
        self.limiter.check(&tokens_key, estimated_tokens)?;
        Ok(())
    }

    /// Tier names known to this policy.
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    /// Upsert the spec only when it differs from what is registered, keeping
    /// the hot path on the limiter's read lock.
    fn ensure_limit(&self, key: &str, spec: RateLimitSpec) -> Result<()> {
        if self.limiter.get_limit(key).as_ref() == Some(&spec) {
            return Ok(());
        }
        self.limiter.add_limit(key, spec)
    }
}
