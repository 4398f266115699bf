//! Price history statistics
//!
//! Turns a raw series of price observations into a [`PriceAnalysis`]:
//! central tendency, dispersion, an OLS trend over the sample index, and
//! hour-of-day / day-of-week / per-zone breakdowns.

use chrono::{Datelike, Timelike};
use std::collections::BTreeMap;

use crate::models::{PriceAnalysis, PricePoint, ZoneAnalysis};

/// Build an analysis from raw points.
///
/// Non-positive and non-finite prices are ignored. Returns `None` when no
/// usable point remains.
pub fn analyze_prices(instance_type: &str, region: &str, points: &[PricePoint]) -> Option<PriceAnalysis> {
    let mut usable: Vec<&PricePoint> = points
        .iter()
        .filter(|point| point.price.is_finite() && point.price > 0.0)
        .collect();
    if usable.is_empty() {
        return None;
    }
    usable.sort_by_key(|point| point.timestamp);

    let prices: Vec<f64> = usable.iter().map(|point| point.price).collect();
    let avg_price = mean(&prices);
    let std_dev = sample_std_dev(&prices, avg_price);
    let (min_price, max_price) = min_max(&prices);
    let trend_slope = linear_regression_slope(&prices);

    let mut hourly: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut weekday: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut by_zone: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for point in &usable {
        hourly.entry(point.timestamp.hour()).or_default().push(point.price);
        weekday
            .entry(point.timestamp.weekday().num_days_from_monday())
            .or_default()
            .push(point.price);
        if let Some(zone) = &point.zone {
            by_zone.entry(zone.clone()).or_default().push(point.price);
        }
    }

    let zones: BTreeMap<String, ZoneAnalysis> = by_zone
        .into_iter()
        .map(|(zone, prices)| {
            let analysis = zone_analysis(&zone, &prices);
            (zone, analysis)
        })
        .collect();

    let best_zone = zones
        .values()
        .fold(None::<&ZoneAnalysis>, |best, zone| match best {
            Some(current) if current.avg_price <= zone.avg_price => Some(current),
            _ => Some(zone),
        })
        .map(|zone| zone.zone.clone());

    let first = usable[0].timestamp;
    let last = usable[usable.len() - 1].timestamp;

    Some(PriceAnalysis {
        instance_type: instance_type.to_string(),
        region: region.to_string(),
        avg_price,
        min_price,
        max_price,
        std_dev,
        volatility: coefficient_of_variation(std_dev, avg_price),
        trend_slope,
        trend_score: normalized_trend(trend_slope, avg_price),
        current_price: prices[prices.len() - 1],
        data_points: prices.len(),
        time_span_hours: (last - first).num_seconds() as f64 / 3600.0,
        hourly_pattern: means_by_key(hourly),
        weekday_pattern: means_by_key(weekday),
        zones,
        best_zone,
    })
}

fn zone_analysis(zone: &str, prices: &[f64]) -> ZoneAnalysis {
    let avg = mean(prices);
    let (min_price, max_price) = min_max(prices);
    ZoneAnalysis {
        zone: zone.to_string(),
        avg_price: avg,
        min_price,
        max_price,
        volatility: coefficient_of_variation(sample_std_dev(prices, avg), avg),
        current_price: prices.last().copied().unwrap_or(avg),
        data_points: prices.len(),
    }
}

fn means_by_key(groups: BTreeMap<u32, Vec<f64>>) -> BTreeMap<u32, f64> {
    groups
        .into_iter()
        .map(|(key, values)| (key, mean(&values)))
        .collect()
}

/// Slope scaled to percent-of-mean per sample and clamped to [-1, 1]
pub fn normalized_trend(slope: f64, avg_price: f64) -> f64 {
    if avg_price > 0.0 {
        (slope / avg_price * 100.0).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Compute the OLS slope of values against their index
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();
    let denom = n * sum_x2 - sum_x.powi(2);
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bessel's correction; 0 for fewer than two samples
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Standard deviation over mean, 0 when the mean is not positive
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    if mean > 0.0 {
        (std_dev / mean).max(0.0)
    } else {
        0.0
    }
}

pub fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
