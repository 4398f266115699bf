//! Plain availability-zone ranking from per-zone price samples

use chrono::Utc;
use std::cmp::Ordering;

use super::analysis::{coefficient_of_variation, mean, min_max, sample_std_dev};
use super::smart::{
    estimate_interruption_rate, explain_zone, price_score, stability_axis, NEUTRAL_CAPACITY,
};
use crate::models::{
    AzRecommendation, CloudProvider, PriceAnalysis, RankingMethod, StabilityLabel, ZoneAnalysis,
    ZoneRanking,
};

/// Confidence of a plain ranking backed by real per-zone prices
pub const PLAIN_REAL_CONFIDENCE: f64 = 0.6;

/// Confidence of a plain ranking over simulated zones
pub const PLAIN_SIMULATED_CONFIDENCE: f64 = 0.3;

/// Differential above which a savings insight is emitted
const PRICE_DIFFERENTIAL_INSIGHT: f64 = 10.0;

const SIMULATED_SAMPLES: usize = 100;
const ZONE_LETTERS: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// Summary statistics for one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneStats {
    pub zone: String,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub volatility: f64,
    pub data_points: usize,
    /// Latest real observation, if any
    pub current_price: Option<f64>,
}

impl ZoneStats {
    pub fn from_samples(zone: impl Into<String>, prices: &[f64]) -> Self {
        let avg = mean(prices);
        let std_dev = sample_std_dev(prices, avg);
        let (min, max) = min_max(prices);
        Self {
            zone: zone.into(),
            mean: avg,
            std_dev,
            min,
            max,
            volatility: coefficient_of_variation(std_dev, avg),
            data_points: prices.len(),
            current_price: None,
        }
    }

    pub fn from_analysis(zone: &ZoneAnalysis) -> Self {
        Self {
            zone: zone.zone.clone(),
            mean: zone.avg_price,
            std_dev: zone.volatility * zone.avg_price,
            min: zone.min_price,
            max: zone.max_price,
            volatility: zone.volatility.max(0.0),
            data_points: zone.data_points,
            current_price: Some(zone.current_price),
        }
    }
}

/// A zone after plain ranking
#[derive(Debug, Clone, PartialEq)]
pub struct AzScore {
    pub rank: usize,
    /// Raw score divided by the best raw score
    pub score: f64,
    pub raw_score: f64,
    pub stats: ZoneStats,
}

/// Lower mean price and lower volatility score higher
pub fn raw_zone_score(mean_price: f64, volatility: f64) -> f64 {
    let volatility = volatility.clamp(0.0, 1.0);
    1.0 / (1.0 + mean_price.max(0.0)) * (1.0 - volatility)
}

/// Sort zones by raw score, assign dense ranks, normalize by the best score
pub fn rank_zones(stats: Vec<ZoneStats>) -> Vec<AzScore> {
    let mut scored: Vec<AzScore> = stats
        .into_iter()
        .filter(|zone| zone.data_points > 0)
        .map(|zone| AzScore {
            rank: 0,
            score: 0.0,
            raw_score: raw_zone_score(zone.mean, zone.volatility),
            stats: zone,
        })
        .collect();

    scored.sort_by(|a, b| b.raw_score.partial_cmp(&a.raw_score).unwrap_or(Ordering::Equal));

    let top = scored.first().map(|zone| zone.raw_score).unwrap_or(0.0);
    for (i, zone) in scored.iter_mut().enumerate() {
        zone.rank = i + 1;
        // All raw scores are zero when the top one is, so every zone ties for best
        zone.score = if top > 0.0 { zone.raw_score / top } else { 1.0 };
    }
    scored
}

/// Zone identifier for the `index`-th zone of a region
pub fn zone_name(region: &str, cloud: CloudProvider, index: usize) -> String {
    match cloud {
        CloudProvider::Aws => format!("{}{}", region, ZONE_LETTERS[index % ZONE_LETTERS.len()]),
        CloudProvider::Gcp => format!("{}-{}", region, ZONE_LETTERS[index % ZONE_LETTERS.len()]),
        CloudProvider::Azure => format!("{}-{}", region, index + 1),
    }
}

/// Number of zones simulated for a region
pub fn simulated_zone_count(region: &str) -> usize {
    match region {
        "us-east-1" => 6,
        "us-west-2" | "eu-west-1" => 4,
        _ => 3,
    }
}

/// Deterministic per-zone samples around `base_price`.
///
/// Zone `i` is offset by `0.03 * i - 0.05` and every sample carries a
/// repeating +/-5% jitter.
pub fn simulate_zone_stats(region: &str, cloud: CloudProvider, base_price: f64) -> Vec<ZoneStats> {
    (0..simulated_zone_count(region))
        .map(|i| {
            let variance = 1.0 + (i as f64 * 0.03 - 0.05);
            let prices: Vec<f64> = (0..SIMULATED_SAMPLES)
                .map(|j| {
                    let jitter = 1.0 + ((j % 10) as f64 - 5.0) * 0.01;
                    base_price * variance * jitter
                })
                .collect();
            ZoneStats::from_samples(zone_name(region, cloud, i), &prices)
        })
        .collect()
}

/// Real per-zone statistics from an analysis, if it carries a breakdown
pub fn zone_stats_from_analysis(analysis: &PriceAnalysis) -> Vec<ZoneStats> {
    analysis.zones.values().map(ZoneStats::from_analysis).collect()
}

/// Build the recommendation returned by the plain path
pub fn plain_recommendation(
    instance_type: &str,
    region: &str,
    ranked: &[AzScore],
    real_data: bool,
) -> AzRecommendation {
    let zones: Vec<ZoneRanking> = ranked
        .iter()
        .map(|zone| {
            let volatility = zone.stats.volatility;
            let interruption_rate = estimate_interruption_rate(NEUTRAL_CAPACITY, volatility);
            let mut ranking = ZoneRanking {
                zone: zone.stats.zone.clone(),
                rank: zone.rank,
                combined_score: zone.score * 100.0,
                price_score: price_score(Some(zone.stats.mean)),
                capacity_score: NEUTRAL_CAPACITY,
                availability_score: 100.0,
                stability_score: stability_axis(volatility, interruption_rate),
                avg_price: zone.stats.mean,
                current_price: zone.stats.current_price,
                price_predicted: !real_data,
                volatility,
                interruption_rate,
                stability: StabilityLabel::from_volatility(volatility),
                available: true,
                explanation: String::new(),
            };
            ranking.explanation = explain_zone(&ranking);
            ranking
        })
        .collect();

    let price_differential_percent = match (ranked.first(), ranked.last()) {
        (Some(best), Some(worst)) if best.stats.mean > 0.0 => {
            (worst.stats.mean - best.stats.mean) / best.stats.mean * 100.0
        }
        _ => 0.0,
    };

    let insights = plain_insights(ranked, price_differential_percent, real_data);

    AzRecommendation {
        instance_type: instance_type.to_string(),
        region: region.to_string(),
        method: RankingMethod::Plain,
        best_zone: zones.first().map(|zone| zone.zone.clone()),
        next_best_zone: zones.get(1).map(|zone| zone.zone.clone()),
        zones,
        price_differential_percent,
        confidence: if real_data {
            PLAIN_REAL_CONFIDENCE
        } else {
            PLAIN_SIMULATED_CONFIDENCE
        },
        data_sources: vec![if real_data {
            "price_history_api".to_string()
        } else {
            "simulated_zones".to_string()
        }],
        insights,
        generated_at: Utc::now(),
    }
}

fn plain_insights(ranked: &[AzScore], differential: f64, real_data: bool) -> Vec<String> {
    let mut insights = Vec::new();
    let Some(best) = ranked.first() else {
        insights.push("No zone price data available".to_string());
        return insights;
    };

    insights.push(format!(
        "Best AZ: {} (avg ${:.4}/hr)",
        best.stats.zone, best.stats.mean
    ));

    if differential > PRICE_DIFFERENTIAL_INSIGHT {
        if let Some(worst) = ranked.last() {
            insights.push(format!(
                "Save {:.1}% by choosing {} over {}",
                differential, best.stats.zone, worst.stats.zone
            ));
        }
    }

    if best.stats.volatility < 0.1 {
        insights.push(format!("{} has stable pricing (low volatility)", best.stats.zone));
    } else if best.stats.volatility > 0.3 {
        insights.push(format!(
            "{} has volatile pricing, keep backup zones ready",
            best.stats.zone
        ));
    }

    if let Some(backup) = ranked.get(1) {
        insights.push(format!("Backup AZ: {}", backup.stats.zone));
    }

    if !real_data {
        insights.push("Zone prices are simulated from regional patterns".to_string());
    }

    insights
}
