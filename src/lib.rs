//! Floodgate - Admission Control for AI Gateways
//!
//! This crate implements the admission-control core of an AI-gateway backend:
//! a multi-key, multi-resource-type fixed-window rate limiter with layered
//! policies for provider budgets, endpoint budgets, and API-key tiers. The
//! limiter is owned by the host server's composition root and shared by
//! reference; it takes a key string and a cost from its caller and returns an
//! allow/deny decision with usage metadata. Keys without a registered limit
//! are admitted unconditionally (fail-open).

pub mod config;
pub mod error;
pub mod http;
pub mod policy;
pub mod ratelimit;

pub use error::{FloodgateError, Result};
