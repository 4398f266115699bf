//! Spot advisor HTTP service
//!
//! Configuration, router and middleware for the `spot-advisor` binary.

pub mod api;
pub mod config;
pub mod middleware;

pub use api::{create_router, AppState};
pub use config::AdvisorConfig;
