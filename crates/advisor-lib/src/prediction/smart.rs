//! Multi-factor zone scoring
//!
//! Each zone gets four 0-100 sub-scores (price, capacity, availability and
//! stability) blended with a [`WeightProfile`]. Zones without observed
//! prices get a size-derived estimate and are flagged as predicted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::zones::zone_name;
use crate::error::{AdvisorError, Result};
use crate::family::estimate_base_price;
use crate::models::{CloudProvider, StabilityLabel, ZoneInfo, ZoneRanking};

/// Capacity assumed when nothing better is known
pub const NEUTRAL_CAPACITY: f64 = 50.0;

/// Volatility assigned to predicted zone prices
pub const PREDICTED_VOLATILITY: f64 = 0.15;

const DEFAULT_ZONE_COUNT: usize = 3;
const MIN_INTERRUPTION_RATE: f64 = 2.0;
const MAX_INTERRUPTION_RATE: f64 = 25.0;
const CLOSE_ALTERNATIVE_GAP: f64 = 5.0;

/// Relative importance of the four zone sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub name: String,
    pub price: f64,
    pub capacity: f64,
    pub availability: f64,
    pub stability: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

impl WeightProfile {
    pub fn balanced() -> Self {
        Self::custom("balanced", 0.20, 0.25, 0.25, 0.30)
    }

    pub fn high_capacity() -> Self {
        Self::custom("high-capacity", 0.15, 0.40, 0.20, 0.25)
    }

    pub fn low_cost() -> Self {
        Self::custom("low-cost", 0.35, 0.15, 0.20, 0.30)
    }

    pub fn custom(name: &str, price: f64, capacity: f64, availability: f64, stability: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
            capacity,
            availability,
            stability,
        }
    }

    /// Named profile lookup, accepting `_` or `-` separators
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "balanced" | "default" => Some(Self::balanced()),
            "high-capacity" | "capacity" => Some(Self::high_capacity()),
            "low-cost" | "cost" => Some(Self::low_cost()),
            _ => None,
        }
    }

    pub fn names() -> [&'static str; 3] {
        ["balanced", "high-capacity", "low-cost"]
    }

    fn weights(&self) -> [(&'static str, f64); 4] {
        [
            ("price", self.price),
            ("capacity", self.capacity),
            ("availability", self.availability),
            ("stability", self.stability),
        ]
    }

    /// Reject negative, non-finite and all-zero weight sets
    pub fn validate(&self) -> Result<()> {
        for (axis, weight) in self.weights() {
            if !weight.is_finite() {
                return Err(AdvisorError::invalid(
                    "weights",
                    format!("{} weight must be a finite number", axis),
                ));
            }
            if weight < 0.0 {
                return Err(AdvisorError::invalid(
                    "weights",
                    format!("{} weight must not be negative (got {})", axis, weight),
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(AdvisorError::invalid(
                "weights",
                "at least one weight must be positive",
            ));
        }
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.price + self.capacity + self.availability + self.stability
    }

    /// Weighted mean of the sub-scores. Assumes [`validate`](Self::validate) passed.
    pub fn combine(&self, price: f64, capacity: f64, availability: f64, stability: f64) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        (self.price * price
            + self.capacity * capacity
            + self.availability * availability
            + self.stability * stability)
            / total
    }
}

/// Price signal feeding one zone's score
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePrice {
    pub avg_price: f64,
    pub current_price: Option<f64>,
    pub volatility: f64,
    pub predicted: bool,
}

impl ZonePrice {
    /// Estimate for a zone with no observations
    pub fn predicted(zone: &str, instance_type: &str, cloud: CloudProvider) -> Self {
        let base = estimate_base_price(instance_type, cloud);
        let factor = if zone.ends_with('a') || zone.ends_with("-1") {
            1.05
        } else if zone.ends_with('c') || zone.ends_with("-3") {
            0.95
        } else {
            1.0
        };
        Self {
            avg_price: base * factor,
            current_price: None,
            volatility: PREDICTED_VOLATILITY,
            predicted: true,
        }
    }
}

/// `100 - price * 100` clamped to 0-100, 50 when the price is unknown
pub fn price_score(price: Option<f64>) -> f64 {
    match price {
        Some(price) if price.is_finite() && price > 0.0 => (100.0 - price * 100.0).clamp(0.0, 100.0),
        _ => 50.0,
    }
}

pub fn availability_score(zone: &ZoneInfo) -> f64 {
    if !zone.available {
        0.0
    } else if zone.restricted {
        50.0
    } else {
        100.0
    }
}

/// Interruption rate in percent, clamped to [2, 25]
pub fn estimate_interruption_rate(capacity: f64, volatility: f64) -> f64 {
    let capacity = capacity.clamp(0.0, 100.0);
    let volatility = volatility.max(0.0);
    (5.0 + (100.0 - capacity) * 0.15 + volatility * 20.0)
        .clamp(MIN_INTERRUPTION_RATE, MAX_INTERRUPTION_RATE)
}

/// Mean of price stability and interruption resilience, 0-100
pub fn stability_axis(volatility: f64, interruption_rate: f64) -> f64 {
    let price_stability = (100.0 - volatility.max(0.0) * 200.0).clamp(0.0, 100.0);
    let interruption = (100.0 - interruption_rate * 5.0).clamp(0.0, 100.0);
    (price_stability + interruption) / 2.0
}

/// Zones assumed when no zone provider answers
pub fn default_zones(region: &str, cloud: CloudProvider) -> Vec<ZoneInfo> {
    (0..DEFAULT_ZONE_COUNT)
        .map(|i| ZoneInfo {
            zone: zone_name(region, cloud, i),
            available: true,
            restricted: false,
            capacity: NEUTRAL_CAPACITY,
        })
        .collect()
}

/// Score one zone; rank is assigned later by [`rank_smart_zones`]
pub fn score_zone(zone: &ZoneInfo, capacity: f64, price: &ZonePrice, weights: &WeightProfile) -> ZoneRanking {
    let capacity = capacity.clamp(0.0, 100.0);
    let volatility = price.volatility.max(0.0);
    let interruption_rate = estimate_interruption_rate(capacity, volatility);

    let price_score = price_score(Some(price.avg_price));
    let availability_score = availability_score(zone);
    let stability_score = stability_axis(volatility, interruption_rate);

    let mut ranking = ZoneRanking {
        zone: zone.zone.clone(),
        rank: 0,
        combined_score: weights.combine(price_score, capacity, availability_score, stability_score),
        price_score,
        capacity_score: capacity,
        availability_score,
        stability_score,
        avg_price: price.avg_price,
        current_price: price.current_price,
        price_predicted: price.predicted,
        volatility,
        interruption_rate,
        stability: StabilityLabel::from_volatility(volatility),
        available: zone.available,
        explanation: String::new(),
    };
    ranking.explanation = explain_zone(&ranking);
    ranking
}

/// Sort by combined score and assign dense ranks
pub fn rank_smart_zones(mut zones: Vec<ZoneRanking>) -> Vec<ZoneRanking> {
    zones.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
    });
    for (i, zone) in zones.iter_mut().enumerate() {
        zone.rank = i + 1;
    }
    zones
}

/// Short human-readable summary of a scored zone
pub fn explain_zone(zone: &ZoneRanking) -> String {
    let mut parts = Vec::new();

    if !zone.available {
        parts.push("not available".to_string());
    } else if zone.availability_score < 100.0 {
        parts.push("restricted".to_string());
    }

    parts.push(
        if zone.capacity_score >= 80.0 {
            "high capacity"
        } else if zone.capacity_score >= 50.0 {
            "moderate capacity"
        } else {
            "limited capacity"
        }
        .to_string(),
    );

    if zone.price_predicted {
        parts.push(format!("predicted price ${:.4}/hr", zone.avg_price));
    } else {
        parts.push(format!("spot price ${:.4}/hr", zone.current_price.unwrap_or(zone.avg_price)));
    }

    parts.push(
        if zone.interruption_rate < 8.0 {
            "low interruption risk"
        } else if zone.interruption_rate < 15.0 {
            "moderate interruption risk"
        } else {
            "high interruption risk"
        }
        .to_string(),
    );

    parts.join(", ")
}

/// Signals that went into a smart ranking
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartSignals {
    pub zone_provider: bool,
    pub real_prices: bool,
    pub capacity_provider: bool,
    /// Share of zones whose price is an estimate, 0-1
    pub predicted_fraction: f64,
}

pub fn smart_confidence(signals: &SmartSignals) -> f64 {
    let mut confidence: f64 = 0.3;
    if signals.zone_provider {
        confidence += 0.25;
    }
    if signals.real_prices {
        confidence += 0.25;
    }
    if signals.capacity_provider {
        confidence += 0.2;
    }
    confidence -= 0.2 * signals.predicted_fraction.clamp(0.0, 1.0);
    confidence.clamp(0.1, 1.0)
}

pub fn smart_insights(zones: &[ZoneRanking], confidence: f64) -> Vec<String> {
    let mut insights = Vec::new();
    let Some(best) = zones.first() else {
        insights.push("No zones available for this instance type".to_string());
        return insights;
    };

    insights.push(format!(
        "Best zone: {} (score {:.1}/100)",
        best.zone, best.combined_score
    ));

    if best.capacity_score >= 80.0 {
        insights.push(format!("High spot capacity in {}", best.zone));
    } else if best.capacity_score < 50.0 {
        insights.push(format!(
            "Limited spot capacity in {}, keep a fallback zone",
            best.zone
        ));
    }

    if best.price_predicted {
        insights.push(format!(
            "Price in {} is estimated at ${:.4}/hr",
            best.zone, best.avg_price
        ));
    } else {
        insights.push(format!(
            "Average spot price in {}: ${:.4}/hr",
            best.zone, best.avg_price
        ));
    }

    if best.interruption_rate < 8.0 {
        insights.push(format!(
            "Low interruption risk (~{:.1}%)",
            best.interruption_rate
        ));
    } else if best.interruption_rate >= 15.0 {
        insights.push(format!(
            "High interruption risk (~{:.1}%), use checkpointing",
            best.interruption_rate
        ));
    }

    if let Some(second) = zones.get(1) {
        if best.combined_score - second.combined_score < CLOSE_ALTERNATIVE_GAP {
            insights.push(format!(
                "{} is a close alternative (score {:.1})",
                second.zone, second.combined_score
            ));
        }
    }

    if confidence < 0.5 {
        insights.push("Low confidence: limited live data for this ranking".to_string());
    } else if confidence >= 0.8 {
        insights.push("High confidence: based on live zone, price and capacity data".to_string());
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str) -> ZoneInfo {
        ZoneInfo {
            zone: name.to_string(),
            available: true,
            restricted: false,
            capacity: NEUTRAL_CAPACITY,
        }
    }

    fn observed(avg: f64, volatility: f64) -> ZonePrice {
        ZonePrice {
            avg_price: avg,
            current_price: Some(avg),
            volatility,
            predicted: false,
        }
    }

    #[test]
    fn test_profiles_are_valid_and_sum_to_one() {
        for name in WeightProfile::names() {
            let profile = WeightProfile::by_name(name).unwrap();
            assert!(profile.validate().is_ok());
            assert!((profile.total() - 1.0).abs() < 1e-12);
        }
        assert_eq!(WeightProfile::by_name("LOW_COST"), Some(WeightProfile::low_cost()));
        assert!(WeightProfile::by_name("fastest").is_none());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let zero = WeightProfile::custom("zero", 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            zero.validate(),
            Err(AdvisorError::InvalidInput { field: "weights", .. })
        ));

        let negative = WeightProfile::custom("neg", 0.5, -0.1, 0.3, 0.3);
        assert!(negative.validate().is_err());

        let nan = WeightProfile::custom("nan", f64::NAN, 0.1, 0.1, 0.1);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_combine_normalizes_by_total() {
        let doubled = WeightProfile::custom("x2", 0.4, 0.5, 0.5, 0.6);
        let balanced = WeightProfile::balanced();
        let a = doubled.combine(80.0, 60.0, 100.0, 70.0);
        let b = balanced.combine(80.0, 60.0, 100.0, 70.0);
        assert!((a - b).abs() < 1e-9);
        // 0.2*80 + 0.25*60 + 0.25*100 + 0.3*70
        assert!((b - 77.0).abs() < 1e-9);
    }

    #[test]
    fn test_interruption_rate_clamped() {
        assert!((estimate_interruption_rate(100.0, 0.0) - 5.0).abs() < 1e-12);
        assert!((estimate_interruption_rate(50.0, 0.1) - 14.5).abs() < 1e-12);
        assert_eq!(estimate_interruption_rate(0.0, 1.0), 25.0);
    }

    #[test]
    fn test_price_and_availability_scores() {
        assert_eq!(price_score(None), 50.0);
        assert!((price_score(Some(0.1)) - 90.0).abs() < 1e-9);
        assert_eq!(price_score(Some(3.0)), 0.0);

        let mut restricted = zone("us-east-1a");
        restricted.restricted = true;
        assert_eq!(availability_score(&restricted), 50.0);
        restricted.available = false;
        assert_eq!(availability_score(&restricted), 0.0);
    }

    #[test]
    fn test_predicted_price_never_sets_current() {
        let a = ZonePrice::predicted("us-east-1a", "m5.large", CloudProvider::Aws);
        let b = ZonePrice::predicted("us-east-1b", "m5.large", CloudProvider::Aws);
        let c = ZonePrice::predicted("us-east-1c", "m5.large", CloudProvider::Aws);
        assert!(a.predicted && a.current_price.is_none());
        assert!(a.avg_price > b.avg_price && b.avg_price > c.avg_price);
        assert_eq!(a.volatility, PREDICTED_VOLATILITY);

        let azure = ZonePrice::predicted("eastus-3", "Standard_D2s_v5", CloudProvider::Azure);
        assert!((azure.avg_price - 0.02 * 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_score_and_rank_zones() {
        let weights = WeightProfile::balanced();
        let cheap = score_zone(&zone("us-east-1a"), 90.0, &observed(0.05, 0.02), &weights);
        let pricey = score_zone(&zone("us-east-1b"), 40.0, &observed(0.30, 0.4), &weights);

        let ranked = rank_smart_zones(vec![pricey, cheap]);
        assert_eq!(ranked[0].zone, "us-east-1a");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        assert!(ranked[0].combined_score > ranked[1].combined_score);
        assert!(ranked[0].explanation.contains("high capacity"));
        assert!(ranked[1].explanation.contains("limited capacity"));
    }

    #[test]
    fn test_default_zones_per_cloud() {
        let aws: Vec<String> = default_zones("us-east-1", CloudProvider::Aws)
            .into_iter()
            .map(|z| z.zone)
            .collect();
        assert_eq!(aws, vec!["us-east-1a", "us-east-1b", "us-east-1c"]);

        let azure = default_zones("eastus", CloudProvider::Azure);
        assert_eq!(azure[0].zone, "eastus-1");
        assert_eq!(azure[0].capacity, NEUTRAL_CAPACITY);
    }

    #[test]
    fn test_confidence_bounds() {
        let heuristic = SmartSignals {
            predicted_fraction: 1.0,
            ..Default::default()
        };
        assert!((smart_confidence(&heuristic) - 0.1).abs() < 1e-12);

        let live = SmartSignals {
            zone_provider: true,
            real_prices: true,
            capacity_provider: true,
            predicted_fraction: 0.0,
        };
        assert!((smart_confidence(&live) - 1.0).abs() < 1e-12);

        let zones_only = SmartSignals {
            zone_provider: true,
            predicted_fraction: 1.0,
            ..Default::default()
        };
        assert!(smart_confidence(&zones_only) <= 0.5);
    }

    #[test]
    fn test_close_alternative_insight() {
        let weights = WeightProfile::balanced();
        let ranked = rank_smart_zones(vec![
            score_zone(&zone("us-east-1a"), 60.0, &observed(0.05, 0.05), &weights),
            score_zone(&zone("us-east-1b"), 60.0, &observed(0.06, 0.05), &weights),
        ]);
        let insights = smart_insights(&ranked, 0.6);
        assert!(insights[0].starts_with("Best zone: us-east-1a"));
        assert!(insights.iter().any(|i| i.contains("close alternative")));
    }
}
