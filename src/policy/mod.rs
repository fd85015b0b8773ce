//! Domain policies layered over the core limiter.
//!
//! Each policy translates a domain concept (provider name, endpoint path,
//! API-key tier) into limiter keys and composes checks with AND semantics.
//! Multi-check policies are sequences of independent limiter calls, not
//! transactions; an early check that passed keeps its consumed budget even
//! when a later check denies.

pub mod apikey;
pub mod endpoint;
pub mod provider;

use std::sync::Arc;

use crate::config::FloodgateConfig;
use crate::error::Result;
use crate::ratelimit::RateLimiter;

pub use apikey::ApiKeyPolicy;
pub use endpoint::{normalize_endpoint, EndpointPolicy};
pub use provider::ProviderPolicy;

/// The full policy layer, wired from configuration at the composition root.
pub struct PolicySet {
    pub provider: ProviderPolicy,
    pub endpoint: EndpointPolicy,
    pub api_key: ApiKeyPolicy,
}

impl PolicySet {
    /// Register all configured budgets against the shared limiter and return
    /// the assembled policies.
    pub fn from_config(limiter: Arc<RateLimiter>, config: &FloodgateConfig) -> Result<Self> {
        let provider = ProviderPolicy::new(Arc::clone(&limiter));
        for (name, budget) in &config.providers {
            provider.register(name, budget)?;
        }

        let endpoint = EndpointPolicy::new(Arc::clone(&limiter));
        for (path, rule) in &config.endpoints {
            endpoint.register(path, rule)?;
        }

        let api_key = ApiKeyPolicy::new(limiter, config.tiers.clone());

        Ok(Self {
            provider,
            endpoint,
            api_key,
        })
    }
}
