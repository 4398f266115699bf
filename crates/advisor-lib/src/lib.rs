//! Spot instance advisor library
//!
//! This crate provides the core functionality for:
//! - Ranking spot instance types from advisory data and price history
//! - Price forecasting and availability zone ranking
//! - A shared TTL cache and bounded concurrent enhancement
//! - Per-client rate limiting
//! - Health checks and observability

pub mod advisor;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod family;
pub mod fanout;
pub mod health;
pub mod models;
pub mod observability;
pub mod prediction;
pub mod providers;
pub mod rate_limit;
pub mod scoring;

pub use advisor::{Advisor, AdvisorOptions, CacheReport};
pub use cache::{CacheConfig, CacheManager, CacheStats};
pub use error::{AdvisorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use prediction::{PredictionEngine, WeightProfile};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use scoring::{ScoringConfig, ScoringEngine, ScoringStrategy};
