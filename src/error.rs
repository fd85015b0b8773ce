//! Error types for the Floodgate admission-control core.

use thiserror::Error;

use crate::ratelimit::RateLimitDecision;

/// Main error type for Floodgate operations.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// A rate limit was exceeded. Carries the full decision so the caller
    /// can populate response headers and schedule a retry.
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(RateLimitDecision),

    /// An invalid limit specification was rejected at registration time.
    #[error("invalid rate limit spec for key '{key}': {reason}")]
    InvalidSpec { key: String, reason: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FloodgateError {
    /// Returns the decision metadata if this error is a denial.
    pub fn decision(&self) -> Option<&RateLimitDecision> {
        match self {
            FloodgateError::RateLimitExceeded(decision) => Some(decision),
            _ => None,
        }
    }

    /// Returns `true` if this error is a rate-limit denial (as opposed to a
    /// configuration or registration error).
    pub fn is_denial(&self) -> bool {
        matches!(self, FloodgateError::RateLimitExceeded(_))
    }
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
