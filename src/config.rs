//! Configuration management for Floodgate.
//!
//! Budgets are declared in YAML and parsed into typed records at startup so
//! typos fail at parse time instead of silently disabling a limit.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};
use crate::ratelimit::{RateLimitSpec, ResourceKind};

/// Main configuration for the admission-control core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Per-provider budgets, keyed by provider name (e.g. "claude")
    #[serde(default)]
    pub providers: HashMap<String, ProviderBudget>,

    /// Per-endpoint budgets, keyed by endpoint path
    #[serde(default)]
    pub endpoints: HashMap<String, LimitRule>,

    /// API-key tier table, keyed by tier name
    #[serde(default)]
    pub tiers: HashMap<String, TierBudget>,

    /// Janitor settings
    #[serde(default)]
    pub janitor: JanitorSettings,
}

/// Budget for a single AI provider: a request counter and an optional token
/// counter, each over its own window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderBudget {
    /// Requests allowed per window
    pub requests: LimitRule,
    /// Tokens allowed per window
    #[serde(default)]
    pub tokens: Option<LimitRule>,
}

/// A limit over one time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitRule {
    /// Total cost allowed per unit of time
    pub limit: i64,
    /// The time unit
    pub unit: TimeUnit,
    /// Optional name/description for this limit
    #[serde(default)]
    pub name: Option<String>,
}

impl LimitRule {
    /// Build a limiter spec of the given resource kind from this rule.
    pub fn to_spec(&self, kind: ResourceKind) -> RateLimitSpec {
        RateLimitSpec::new(kind, self.limit, self.unit.duration())
    }
}

/// Time unit for rate limit windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Get the duration of this time unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(3600),
            TimeUnit::Day => Duration::from_secs(86400),
        }
    }
}

/// Budget for one API-key tier.
///
/// Unknown fields are rejected so a misspelled field fails at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierBudget {
    /// Requests allowed per hour for keys in this tier
    pub requests_per_hour: i64,
    /// Tokens allowed per day for keys in this tier
    pub tokens_per_day: i64,
}

/// Janitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorSettings {
    /// Seconds between background sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Seconds an expired window is retained before eviction
    #[serde(default = "default_retention_grace")]
    pub retention_grace_secs: u64,
}

impl JanitorSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn retention_grace(&self) -> Duration {
        Duration::from_secs(self.retention_grace_secs)
    }
}

impl Default for JanitorSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            retention_grace_secs: default_retention_grace(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_retention_grace() -> u64 {
    3600
}

impl FloodgateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading admission control configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| FloodgateError::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
providers:
  claude:
    requests:
      limit: 100
      unit: minute
    tokens:
      limit: 50000
      unit: minute
  openai:
    requests:
      limit: 60
      unit: minute
endpoints:
  /api/v1/conversations:
    limit: 30
    unit: minute
tiers:
  free:
    requests_per_hour: 100
    tokens_per_day: 100000
  pro:
    requests_per_hour: 5000
    tokens_per_day: 10000000
janitor:
  sweep_interval_secs: 60
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();

        let claude = &config.providers["claude"];
        assert_eq!(claude.requests.limit, 100);
        assert_eq!(claude.requests.unit, TimeUnit::Minute);
        assert_eq!(claude.tokens.as_ref().unwrap().limit, 50000);
        assert!(config.providers["openai"].tokens.is_none());

        assert_eq!(config.endpoints["/api/v1/conversations"].limit, 30);
        assert_eq!(config.tiers["free"].requests_per_hour, 100);
        assert_eq!(config.tiers["pro"].tokens_per_day, 10_000_000);

        // Explicit interval, defaulted grace
        assert_eq!(config.janitor.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.janitor.retention_grace(), Duration::from_secs(3600));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FloodgateConfig::from_yaml("{}").unwrap();
        assert!(config.providers.is_empty());
        assert!(config.endpoints.is_empty());
        assert!(config.tiers.is_empty());
        assert_eq!(config.janitor.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_misspelled_tier_field_rejected() {
        let yaml = r#"
tiers:
  free:
    requests_per_hour: 100
    tokens_per_dya: 100000
"#;
        let err = FloodgateConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }

    #[test]
    fn test_time_unit_durations() {
        assert_eq!(TimeUnit::Second.duration(), Duration::from_secs(1));
        assert_eq!(TimeUnit::Minute.duration(), Duration::from_secs(60));
        assert_eq!(TimeUnit::Hour.duration(), Duration::from_secs(3600));
        assert_eq!(TimeUnit::Day.duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_limit_rule_to_spec() {
        let rule = LimitRule {
            limit: 100,
            unit: TimeUnit::Hour,
            name: None,
        };
        let spec = rule.to_spec(ResourceKind::Requests);
        assert_eq!(spec.limit, 100);
        assert_eq!(spec.window, Duration::from_secs(3600));
        assert_eq!(spec.kind, ResourceKind::Requests);
    }
}
