//! Historical price strategy
//!
//! Scores volatility, trend, capacity pool depth, time-of-day consistency
//! and "hidden gem" popularity. Uses live price history when the provider
//! is bound to the request region and answers; otherwise derives the same
//! factors from specs and advisory data.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::ScoringStrategy;
use crate::family::generation_family;
use crate::models::{
    Architecture, DataSource, InstanceCandidate, InstanceCategory, InstanceGeneration, PriceAnalysis,
    ScoreFactors, UsageRequirements,
};
use crate::prediction::analysis::{coefficient_of_variation, mean, population_std_dev};
use crate::prediction::{DEFAULT_CALL_TIMEOUT, DEFAULT_LOOKBACK_DAYS};
use crate::providers::PriceHistoryProvider;

pub const STRATEGY_NAME: &str = "historical_price_analysis";

const VOLATILITY_WEIGHT: f64 = 0.25;
const TREND_WEIGHT: f64 = 0.20;
const CAPACITY_WEIGHT: f64 = 0.20;
const TIME_PATTERN_WEIGHT: f64 = 0.20;
const POPULARITY_WEIGHT: f64 = 0.15;

const MAINSTREAM_FAMILIES: &[&str] = &[
    "m5", "m6i", "m6a", "m7i", "c5", "c6i", "c6a", "c7i", "r5", "r6i", "r6a", "r7i",
];

const LARGE_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-northeast-1",
];

pub struct HistoricalPriceStrategy {
    price_history: Option<Arc<dyn PriceHistoryProvider>>,
    prefetched: Arc<HashMap<String, PriceAnalysis>>,
    lookback_days: u32,
    call_timeout: Duration,
}

impl Default for HistoricalPriceStrategy {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl HistoricalPriceStrategy {
    /// Strategy without a price source
    pub fn heuristic() -> Self {
        Self {
            price_history: None,
            prefetched: Arc::new(HashMap::new()),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_price_history(provider: Arc<dyn PriceHistoryProvider>) -> Self {
        Self {
            price_history: Some(provider),
            ..Self::heuristic()
        }
    }

    /// Analyses fetched ahead of time in one batch
    pub fn with_prefetched(mut self, analyses: HashMap<String, PriceAnalysis>) -> Self {
        self.prefetched = Arc::new(analyses);
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Whether live history can be consulted at all
    pub fn uses_live_data(&self) -> bool {
        !self.prefetched.is_empty()
            || self
                .price_history
                .as_ref()
                .is_some_and(|provider| provider.is_available())
    }

    async fn analysis_for(&self, instance_type: &str) -> Option<PriceAnalysis> {
        if let Some(analysis) = self.prefetched.get(instance_type) {
            return Some(analysis.clone());
        }

        let provider = self.price_history.as_ref().filter(|p| p.is_available())?;
        let call = provider.get_price_analysis(instance_type, self.lookback_days);
        match timeout(self.call_timeout, call).await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => {
                warn!(instance_type = %instance_type, error = %e, "Price history failed, using heuristics");
                None
            }
            Err(_) => {
                warn!(instance_type = %instance_type, "Price history timed out, using heuristics");
                None
            }
        }
    }
}

#[async_trait]
impl ScoringStrategy for HistoricalPriceStrategy {
    fn name(&self) -> &str {
        STRATEGY_NAME
    }

    async fn compute(
        &self,
        candidate: &InstanceCandidate,
        requirements: &UsageRequirements,
    ) -> Result<ScoreFactors> {
        let analysis = self
            .analysis_for(candidate.instance_type())
            .await
            .filter(|analysis| analysis.data_points > 0);

        let mut factors = match &analysis {
            Some(analysis) => {
                debug!(instance_type = %candidate.instance_type(), points = analysis.data_points, "Scoring from price history");
                ScoreFactors {
                    volatility: volatility_from_history(analysis.volatility),
                    trend: trend_from_history(analysis.trend_score),
                    capacity: capacity_from_history(analysis),
                    time_pattern: time_pattern_from_history(analysis),
                    popularity: popularity_score(candidate),
                    combined: 0.0,
                    data_source: DataSource::Historical,
                    insights: vec!["Using recorded spot price history for analysis".to_string()],
                }
            }
            None => ScoreFactors {
                volatility: volatility_heuristic(candidate),
                trend: trend_heuristic(candidate),
                capacity: capacity_heuristic(candidate, &requirements.region),
                time_pattern: time_pattern_heuristic(candidate),
                popularity: popularity_score(candidate),
                combined: 0.0,
                data_source: DataSource::Heuristic,
                insights: Vec::new(),
            },
        };

        factors.combined = combine(&factors);
        factors.insights.extend(factor_insights(&factors));
        Ok(factors)
    }
}

pub fn combine(factors: &ScoreFactors) -> f64 {
    factors.volatility * VOLATILITY_WEIGHT
        + factors.trend * TREND_WEIGHT
        + factors.capacity * CAPACITY_WEIGHT
        + factors.time_pattern * TIME_PATTERN_WEIGHT
        + factors.popularity * POPULARITY_WEIGHT
}

pub fn volatility_from_history(volatility: f64) -> f64 {
    let volatility = volatility.max(0.0);
    if volatility <= 0.05 {
        0.95
    } else if volatility <= 0.10 {
        0.85
    } else if volatility <= 0.20 {
        0.70
    } else if volatility <= 0.35 {
        0.50
    } else {
        0.30
    }
}

/// Falling prices score above 0.5, rising below
pub fn trend_from_history(trend_score: f64) -> f64 {
    (0.5 - trend_score * 0.4).clamp(0.0, 1.0)
}

pub fn capacity_from_history(analysis: &PriceAnalysis) -> f64 {
    let mut score: f64 = 0.7;
    if analysis.best_zone.is_some() {
        score += 0.1;
    }
    score += match analysis.data_points {
        n if n >= 500 => 0.15,
        n if n >= 100 => 0.10,
        n if n >= 50 => 0.05,
        _ => 0.0,
    };
    f64::min(score, 1.0)
}

/// Consistency of the hour-of-day mean prices
pub fn time_pattern_from_history(analysis: &PriceAnalysis) -> f64 {
    let hourly: Vec<f64> = analysis.hourly_pattern.values().copied().collect();
    if hourly.len() < 2 {
        return 0.6;
    }
    let avg = mean(&hourly);
    let cv = coefficient_of_variation(population_std_dev(&hourly, avg), avg);
    if cv <= 0.02 {
        0.95
    } else if cv <= 0.05 {
        0.80
    } else if cv <= 0.10 {
        0.65
    } else {
        0.50
    }
}

pub fn volatility_heuristic(candidate: &InstanceCandidate) -> f64 {
    let specs = &candidate.specs;
    let mut score: f64 = 0.7;

    score += match specs.generation {
        InstanceGeneration::Current => 0.2,
        InstanceGeneration::Previous => 0.1,
        InstanceGeneration::Legacy => -0.1,
        InstanceGeneration::Deprecated => -0.3,
    };

    if specs.vcpu >= 16 {
        score += 0.1;
    } else if specs.vcpu <= 2 {
        score -= 0.1;
    }

    score += match specs.category {
        InstanceCategory::StorageOptimized => 0.1,
        InstanceCategory::MemoryOptimized => 0.05,
        _ => 0.0,
    };

    if specs.architecture == Architecture::Arm64 {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

pub fn trend_heuristic(candidate: &InstanceCandidate) -> f64 {
    let bucket = candidate.advisory.interruption.bucket();
    let mut score = match candidate.specs.generation {
        InstanceGeneration::Current if bucket <= 1 => 0.85,
        InstanceGeneration::Current => 0.7,
        InstanceGeneration::Previous => 0.6,
        _ => 0.5,
    };
    if bucket >= 3 {
        score -= 0.2;
    }
    f64::clamp(score, 0.0, 1.0)
}

pub fn capacity_heuristic(candidate: &InstanceCandidate, region: &str) -> f64 {
    let specs = &candidate.specs;
    let mut score: f64 = 0.7;

    if MAINSTREAM_FAMILIES.contains(&generation_family(&specs.instance_type)) {
        score += 0.2;
    }
    if specs.architecture == Architecture::Arm64 && specs.generation == InstanceGeneration::Current {
        score += 0.1;
    }
    if LARGE_REGIONS.contains(&region) {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

pub fn time_pattern_heuristic(candidate: &InstanceCandidate) -> f64 {
    match candidate.advisory.interruption.bucket() {
        0 => 0.95,
        1 => 0.85,
        2 => 0.70,
        3 => 0.50,
        _ => 0.30,
    }
}

/// High savings with low interruption marks an underused type
pub fn popularity_score(candidate: &InstanceCandidate) -> f64 {
    let savings = f64::from(candidate.advisory.savings_percent) / 100.0;
    let stability = 1.0 - f64::from(candidate.advisory.interruption.bucket()) / 4.0;

    if savings >= 0.7 && stability >= 0.75 {
        0.95
    } else if savings >= 0.6 && stability >= 0.75 {
        0.85
    } else if stability >= 0.75 {
        0.7
    } else {
        0.5
    }
}

fn factor_insights(factors: &ScoreFactors) -> Vec<String> {
    let mut insights = Vec::new();

    if factors.volatility >= 0.85 {
        insights.push("Stable pricing: spot price rarely fluctuates".to_string());
    } else if factors.volatility <= 0.5 {
        insights.push("Volatile pricing: expect price swings, consider a max price".to_string());
    }

    if factors.popularity >= 0.9 {
        insights.push("Hidden gem: high savings with low interruption suggests spare capacity".to_string());
    }

    if factors.trend >= 0.8 {
        insights.push("Favourable trend: availability has held steady".to_string());
    } else if factors.trend <= 0.4 {
        insights.push("Rising demand: expect more interruptions over time".to_string());
    }

    if factors.capacity >= 0.85 {
        insights.push("Deep capacity pool: widely offered across zones".to_string());
    }

    if factors.time_pattern >= 0.9 {
        insights.push("Launch any time: availability is consistent across the day".to_string());
    } else if factors.time_pattern <= 0.5 {
        insights.push("Time-sensitive: prefer off-peak hours for launches".to_string());
    }

    if factors.combined >= 0.85 {
        insights.push("Top pick: every factor favours this instance".to_string());
    } else if factors.combined >= 0.7 {
        insights.push("Recommended: good overall spot profile".to_string());
    } else if factors.combined <= 0.5 {
        insights.push("Use with caution: diversify across instance types".to_string());
    }

    insights
}
