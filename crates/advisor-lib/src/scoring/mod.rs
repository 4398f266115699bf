//! Instance ranking
//!
//! Candidates get a deterministic baseline score from advisory data, then
//! each [`ScoringStrategy`] contributes extra factors. The final score blends
//! the two:
//!
//! ```text
//! final = 0.6 * baseline + 0.4 * mean(strategy combined scores)
//! ```

pub mod baseline;
pub mod engine;
pub mod filter;
pub mod historical;
pub mod insights;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::models::{InstanceCandidate, ScoreFactors, UsageRequirements};

pub use baseline::baseline_score;
pub use engine::{ScoringConfig, ScoringEngine};
pub use filter::{EligibilityFilter, FilterOutcome, Rejection};
pub use historical::HistoricalPriceStrategy;

pub const BASELINE_WEIGHT: f64 = 0.60;
pub const STRATEGY_WEIGHT: f64 = 0.40;

/// Extra scoring factors for a candidate
#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn compute(
        &self,
        candidate: &InstanceCandidate,
        requirements: &UsageRequirements,
    ) -> Result<ScoreFactors>;
}

/// Blend a baseline with strategy results; baseline alone when none ran
pub fn blend_final_score(baseline: f64, strategy_scores: &BTreeMap<String, ScoreFactors>) -> f64 {
    if strategy_scores.is_empty() {
        return baseline;
    }
    let mean = strategy_scores.values().map(|f| f.combined).sum::<f64>()
        / strategy_scores.len() as f64;
    baseline * BASELINE_WEIGHT + mean * STRATEGY_WEIGHT
}
