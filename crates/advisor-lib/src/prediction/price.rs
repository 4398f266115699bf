//! Short-horizon price forecasting

use std::collections::BTreeMap;

use crate::models::{PriceAnalysis, PricePrediction, TrendDirection, VolatilityRisk};

/// Method tag for forecasts backed by live history
pub const REGRESSION_METHOD: &str = "linear_regression_7day";

/// Method tag for the no-data fallback
pub const HEURISTIC_METHOD: &str = "heuristic";

/// Confidence reported when no usable history exists
pub const HEURISTIC_CONFIDENCE: f64 = 0.3;

/// Minimum populated hours before a launch window is suggested
pub const MIN_HOURS_FOR_LAUNCH_WINDOW: usize = 12;

/// Minimum observations for a regression forecast
pub const MIN_POINTS_FOR_FORECAST: usize = 2;

const TREND_DEADBAND: f64 = 0.1;
const ONE_WEEK_HOURS: f64 = 168.0;

/// Forecast from a price analysis.
///
/// Returns the heuristic prediction when the analysis has fewer than
/// [`MIN_POINTS_FOR_FORECAST`] points.
pub fn predict_from_analysis(analysis: &PriceAnalysis) -> PricePrediction {
    if analysis.data_points < MIN_POINTS_FOR_FORECAST {
        return heuristic_prediction(&analysis.instance_type, &analysis.region);
    }

    let project = |hours: f64| (analysis.current_price + analysis.trend_slope * hours).max(0.0);

    PricePrediction {
        instance_type: analysis.instance_type.clone(),
        region: analysis.region.clone(),
        current_price: analysis.current_price,
        predicted_1h: project(1.0),
        predicted_6h: project(6.0),
        predicted_24h: project(24.0),
        trend: trend_direction(analysis.trend_score),
        volatility_risk: volatility_risk(analysis.volatility),
        confidence: forecast_confidence(analysis),
        optimal_launch_window: optimal_launch_window(&analysis.hourly_pattern),
        method: REGRESSION_METHOD.to_string(),
        data_points: analysis.data_points,
    }
}

/// Fixed low-confidence prediction used when no history is usable
pub fn heuristic_prediction(instance_type: &str, region: &str) -> PricePrediction {
    PricePrediction {
        instance_type: instance_type.to_string(),
        region: region.to_string(),
        current_price: 0.0,
        predicted_1h: 0.0,
        predicted_6h: 0.0,
        predicted_24h: 0.0,
        trend: TrendDirection::Unknown,
        volatility_risk: VolatilityRisk::Unknown,
        confidence: HEURISTIC_CONFIDENCE,
        optimal_launch_window: "anytime (no data)".to_string(),
        method: HEURISTIC_METHOD.to_string(),
        data_points: 0,
    }
}

pub fn trend_direction(trend_score: f64) -> TrendDirection {
    if trend_score > TREND_DEADBAND {
        TrendDirection::Rising
    } else if trend_score < -TREND_DEADBAND {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

pub fn volatility_risk(volatility: f64) -> VolatilityRisk {
    if volatility < 0.1 {
        VolatilityRisk::Low
    } else if volatility < 0.25 {
        VolatilityRisk::Medium
    } else {
        VolatilityRisk::High
    }
}

/// Confidence in [0.1, 0.95] from data volume, volatility and time span
pub fn forecast_confidence(analysis: &PriceAnalysis) -> f64 {
    let mut confidence: f64 = 0.5;

    confidence += match analysis.data_points {
        n if n >= 500 => 0.25,
        n if n >= 100 => 0.15,
        n if n >= 50 => 0.05,
        _ => 0.0,
    };

    if analysis.volatility < 0.1 {
        confidence += 0.2;
    } else if analysis.volatility < 0.2 {
        confidence += 0.1;
    } else if analysis.volatility > 0.4 {
        confidence -= 0.15;
    }

    if analysis.time_span_hours >= ONE_WEEK_HOURS {
        confidence += 0.05;
    }

    confidence.clamp(0.1, 0.95)
}

/// Two-hour window starting at the cheapest hour, in UTC
pub fn optimal_launch_window(hourly_pattern: &BTreeMap<u32, f64>) -> String {
    if hourly_pattern.len() < MIN_HOURS_FOR_LAUNCH_WINDOW {
        return "insufficient data".to_string();
    }

    let cheapest = hourly_pattern
        .iter()
        .fold(None::<(u32, f64)>, |best, (&hour, &price)| match best {
            Some((_, best_price)) if best_price <= price => best,
            _ => Some((hour, price)),
        });

    match cheapest {
        Some((hour, _)) => format!("{:02}:00-{:02}:00 UTC", hour, (hour + 2) % 24),
        None => "insufficient data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(points: usize, volatility: f64, slope: f64, trend_score: f64) -> PriceAnalysis {
        PriceAnalysis {
            instance_type: "m5.large".to_string(),
            region: "us-east-1".to_string(),
            avg_price: 0.05,
            min_price: 0.04,
            max_price: 0.06,
            std_dev: 0.05 * volatility,
            volatility,
            trend_slope: slope,
            trend_score,
            current_price: 0.05,
            data_points: points,
            time_span_hours: 24.0,
            hourly_pattern: BTreeMap::new(),
            weekday_pattern: BTreeMap::new(),
            zones: BTreeMap::new(),
            best_zone: None,
        }
    }

    #[test]
    fn test_projection_uses_slope_and_floors_at_zero() {
        let rising = predict_from_analysis(&analysis(10, 0.05, 0.001, 0.5));
        assert!((rising.predicted_1h - 0.051).abs() < 1e-12);
        assert!((rising.predicted_6h - 0.056).abs() < 1e-12);
        assert!((rising.predicted_24h - 0.074).abs() < 1e-12);
        assert_eq!(rising.trend, TrendDirection::Rising);
        assert_eq!(rising.method, REGRESSION_METHOD);

        let crashing = predict_from_analysis(&analysis(10, 0.05, -0.01, -1.0));
        assert_eq!(crashing.predicted_24h, 0.0);
        assert_eq!(crashing.trend, TrendDirection::Falling);
    }

    #[test]
    fn test_flat_two_point_series_is_stable() {
        let prediction = predict_from_analysis(&analysis(2, 0.0, 0.0, 0.0));
        assert_eq!(prediction.trend, TrendDirection::Stable);
        assert_eq!(prediction.volatility_risk, VolatilityRisk::Low);
    }

    #[test]
    fn test_single_point_falls_back_to_heuristic() {
        let prediction = predict_from_analysis(&analysis(1, 0.0, 0.0, 0.0));
        assert_eq!(prediction.confidence, HEURISTIC_CONFIDENCE);
        assert_eq!(prediction.trend, TrendDirection::Unknown);
        assert_eq!(prediction.method, HEURISTIC_METHOD);
    }

    #[test]
    fn test_trend_deadband() {
        assert_eq!(trend_direction(0.1), TrendDirection::Stable);
        assert_eq!(trend_direction(0.11), TrendDirection::Rising);
        assert_eq!(trend_direction(-0.1), TrendDirection::Stable);
        assert_eq!(trend_direction(-0.11), TrendDirection::Falling);
    }

    #[test]
    fn test_volatility_risk_bands() {
        assert_eq!(volatility_risk(0.05), VolatilityRisk::Low);
        assert_eq!(volatility_risk(0.1), VolatilityRisk::Medium);
        assert_eq!(volatility_risk(0.24), VolatilityRisk::Medium);
        assert_eq!(volatility_risk(0.25), VolatilityRisk::High);
    }

    #[test]
    fn test_confidence_adjustments() {
        // 0.5 + 0.25 (points) + 0.2 (low volatility) = 0.95
        assert!((forecast_confidence(&analysis(600, 0.05, 0.0, 0.0)) - 0.95).abs() < 1e-12);

        // 0.5 + 0.15 + 0.1 = 0.75
        assert!((forecast_confidence(&analysis(150, 0.15, 0.0, 0.0)) - 0.75).abs() < 1e-12);

        // 0.5 - 0.15 = 0.35
        assert!((forecast_confidence(&analysis(10, 0.5, 0.0, 0.0)) - 0.35).abs() < 1e-12);

        let mut week = analysis(60, 0.3, 0.0, 0.0);
        week.time_span_hours = 200.0;
        // 0.5 + 0.05 + 0.05 = 0.6
        assert!((forecast_confidence(&week) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_capped_at_ceiling() {
        // 0.5 + 0.25 + 0.2 + 0.05 = 1.0, clamped
        let mut best = analysis(800, 0.02, 0.0, 0.0);
        best.time_span_hours = 400.0;
        assert_eq!(forecast_confidence(&best), 0.95);
    }

    #[test]
    fn test_optimal_launch_window() {
        let sparse: BTreeMap<u32, f64> = (0..11).map(|h| (h, 1.0)).collect();
        assert_eq!(optimal_launch_window(&sparse), "insufficient data");

        let mut full: BTreeMap<u32, f64> = (0..24).map(|h| (h, 1.0 + h as f64 * 0.01)).collect();
        full.insert(23, 0.5);
        assert_eq!(optimal_launch_window(&full), "23:00-01:00 UTC");

        let flat: BTreeMap<u32, f64> = (0..24).map(|h| (h, 1.0)).collect();
        assert_eq!(optimal_launch_window(&flat), "00:00-02:00 UTC");
    }
}
