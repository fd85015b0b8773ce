//! Rate limiting logic and state management.

pub mod backend;
pub mod decision;
pub mod janitor;
pub mod limiter;
pub mod spec;
pub mod usage;

pub use backend::AdmissionBackend;
pub use decision::RateLimitDecision;
pub use janitor::Janitor;
pub use limiter::{RateLimiter, DEFAULT_RETENTION_GRACE};
pub use spec::{RateLimitSpec, ResourceKind};
pub use usage::UsageState;
