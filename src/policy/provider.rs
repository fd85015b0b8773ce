//! Per-provider request and token budgets.

use std::sync::Arc;

use tracing::trace;

use crate::config::ProviderBudget;
use crate::error::Result;
use crate::ratelimit::{RateLimiter, ResourceKind};

/// Admission policy for outbound AI-provider calls.
///
/// Each provider carries a requests-per-window budget and, optionally, a
/// tokens-per-window budget. Both must pass for a call to be admitted.
pub struct ProviderPolicy {
    limiter: Arc<RateLimiter>,
}

impl ProviderPolicy {
    /// Create a policy over the shared limiter.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Register a provider's budgets with the limiter.
    pub fn register(&self, provider: &str, budget: &ProviderBudget) -> Result<()> {
        self.limiter.add_limit(
            &requests_key(provider),
            budget.requests.to_spec(ResourceKind::Requests),
        )?;
        if let Some(tokens) = &budget.tokens {
            self.limiter
                .add_limit(&tokens_key(provider), tokens.to_spec(ResourceKind::Tokens))?;
        }
        Ok(())
    }

    /// Check whether one call to `provider` may proceed.
    ///
    /// The request budget is checked first, then the token budget with
    /// `estimated_tokens` as the cost. The sequence is not transactional: a
    /// call that passes the request check but fails the token check has
    /// already consumed one unit of request budget. Providers without a
    /// registered budget are admitted (fail-open).
    pub fn check_request(&self, provider: &str, model: &str, estimated_tokens: i64) -> Result<()> {
        trace!(
            provider = %provider,
            model = %model,
            estimated_tokens = estimated_tokens,
            "Checking provider budgets"
        );

        self.limiter.check(&requests_key(provider), 1)?;
        self.limiter.check(&tokens_key(provider), estimated_tokens)?;
        Ok(())
    }
}

fn requests_key(provider: &str) -> String {
    format!("{}:requests", provider)
}

fn tokens_key(provider: &str) -> String {
    format!("{}:tokens", provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitRule, TimeUnit};

    fn budget(requests: i64, tokens: Option<i64>, unit: TimeUnit) -> ProviderBudget {
        ProviderBudget {
            requests: LimitRule {
                limit: requests,
                unit,
                name: None,
            },
            tokens: tokens.map(|limit| LimitRule {
                limit,
                unit,
                name: None,
            }),
        }
    }

    #[test]
    fn test_provider_request_budget_end_to_end() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = ProviderPolicy::new(Arc::clone(&limiter));
        policy
            .register("claude", &budget(2, None, TimeUnit::Hour))
            .unwrap();

        policy.check_request("claude", "modelX", 0).unwrap();
        policy.check_request("claude", "modelX", 0).unwrap();

        let err = policy.check_request("claude", "modelX", 0).unwrap_err();
        let decision = err.decision().unwrap();
        assert_eq!(decision.key, "claude:requests");
        assert!(decision.retry_after <= std::time::Duration::from_secs(3600));
    }

    #[test]
    fn test_token_denial_still_consumes_request_budget() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = ProviderPolicy::new(Arc::clone(&limiter));
        policy
            .register("claude", &budget(100, Some(1000), TimeUnit::Minute))
            .unwrap();

        // Saturate the token window
        policy.check_request("claude", "modelX", 1000).unwrap();
        assert_eq!(limiter.get_usage("claude:requests").unwrap().count, 1);

        // Token check denies, but the request check before it already counted
        let err = policy.check_request("claude", "modelX", 500).unwrap_err();
        assert_eq!(err.decision().unwrap().key, "claude:tokens");
        assert_eq!(limiter.get_usage("claude:requests").unwrap().count, 2);
    }

    #[test]
    fn test_unregistered_provider_is_admitted() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = ProviderPolicy::new(Arc::clone(&limiter));

        for _ in 0..100 {
            policy.check_request("unknown", "modelX", 1_000_000).unwrap();
        }
        assert!(limiter.get_all_usage().is_empty());
    }

    #[test]
    fn test_providers_have_independent_budgets() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = ProviderPolicy::new(Arc::clone(&limiter));
        policy
            .register("claude", &budget(1, None, TimeUnit::Hour))
            .unwrap();
        policy
            .register("openai", &budget(1, None, TimeUnit::Hour))
            .unwrap();

        policy.check_request("claude", "modelX", 0).unwrap();
        assert!(policy.check_request("claude", "modelX", 0).is_err());
        policy.check_request("openai", "modelY", 0).unwrap();
    }
}
