//! Region-bound prediction engine

use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::price::{heuristic_prediction, predict_from_analysis};
use super::smart::{
    default_zones, rank_smart_zones, score_zone, smart_confidence, smart_insights,
    SmartSignals, WeightProfile, ZonePrice,
};
use super::zones::{plain_recommendation, rank_zones, simulate_zone_stats, zone_stats_from_analysis};
use crate::error::{AdvisorError, Result};
use crate::family::estimate_base_price;
use crate::models::{
    AzRecommendation, CloudProvider, PriceAnalysis, PricePrediction, RankingMethod, ZoneInfo,
};
use crate::providers::{CapacityProvider, PriceHistoryProvider, ZoneProvider};

/// Default price history window
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Default bound on any single provider call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Confidence multiplier applied when the smart path falls back
pub const FALLBACK_CONFIDENCE_FACTOR: f64 = 0.75;

#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub lookback_days: u32,
    pub call_timeout: Duration,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Price forecasts and zone rankings for one region
pub struct PredictionEngine {
    region: String,
    cloud: CloudProvider,
    price_history: Option<Arc<dyn PriceHistoryProvider>>,
    zone_provider: Option<Arc<dyn ZoneProvider>>,
    capacity_provider: Option<Arc<dyn CapacityProvider>>,
    config: PredictionConfig,
}

impl PredictionEngine {
    pub fn new(region: impl Into<String>, cloud: CloudProvider) -> Self {
        Self {
            region: region.into(),
            cloud,
            price_history: None,
            zone_provider: None,
            capacity_provider: None,
            config: PredictionConfig::default(),
        }
    }

    pub fn with_price_history(mut self, provider: Arc<dyn PriceHistoryProvider>) -> Self {
        self.price_history = Some(provider);
        self
    }

    pub fn with_zone_provider(mut self, provider: Arc<dyn ZoneProvider>) -> Self {
        self.zone_provider = Some(provider);
        self
    }

    pub fn with_capacity_provider(mut self, provider: Arc<dyn CapacityProvider>) -> Self {
        self.capacity_provider = Some(provider);
        self
    }

    pub fn with_config(mut self, config: PredictionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cloud(&self) -> CloudProvider {
        self.cloud
    }

    /// Live analysis for an instance type, `None` on any provider problem
    pub async fn fetch_analysis(&self, instance_type: &str) -> Option<PriceAnalysis> {
        let provider = self.price_history.as_ref()?;
        if !provider.is_available() {
            debug!(instance_type = %instance_type, "Price history unavailable");
            return None;
        }

        let call = provider.get_price_analysis(instance_type, self.config.lookback_days);
        match timeout(self.config.call_timeout, call).await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => {
                warn!(instance_type = %instance_type, error = %e, "Price history lookup failed");
                None
            }
            Err(_) => {
                warn!(instance_type = %instance_type, "Price history lookup timed out");
                None
            }
        }
    }

    pub async fn predict_price(&self, instance_type: &str) -> PricePrediction {
        match self.fetch_analysis(instance_type).await {
            Some(analysis) => predict_from_analysis(&analysis),
            None => heuristic_prediction(instance_type, &self.region),
        }
    }

    /// Price-only zone ranking from real per-zone history or a simulation
    pub async fn recommend_az(&self, instance_type: &str) -> AzRecommendation {
        let analysis = self.fetch_analysis(instance_type).await;
        self.plain_ranking(instance_type, analysis.as_ref())
    }

    fn plain_ranking(
        &self,
        instance_type: &str,
        analysis: Option<&PriceAnalysis>,
    ) -> AzRecommendation {
        let real_stats = analysis.map(zone_stats_from_analysis).unwrap_or_default();

        let (stats, real_data) = if real_stats.is_empty() {
            let base_price = analysis
                .map(|analysis| analysis.avg_price)
                .filter(|price| *price > 0.0)
                .unwrap_or_else(|| estimate_base_price(instance_type, self.cloud));
            (simulate_zone_stats(&self.region, self.cloud, base_price), false)
        } else {
            (real_stats, true)
        };

        let ranked = rank_zones(stats);
        debug!(
            instance_type = %instance_type,
            zones = ranked.len(),
            real_data = real_data,
            "Ranked zones by price"
        );
        plain_recommendation(instance_type, &self.region, &ranked, real_data)
    }

    /// Multi-factor zone ranking.
    ///
    /// Invalid weights are the only error. Zone or capacity provider
    /// failures fall back to the price-only ranking, reusing the price
    /// analysis already fetched, with reduced confidence.
    pub async fn smart_recommend_az(
        &self,
        instance_type: &str,
        weights: &WeightProfile,
    ) -> Result<AzRecommendation> {
        if instance_type.trim().is_empty() {
            return Err(AdvisorError::invalid("instance_type", "must not be empty"));
        }
        weights.validate()?;

        let analysis = self.fetch_analysis(instance_type).await;
        match self.smart_ranking(instance_type, weights, analysis.as_ref()).await {
            Ok(recommendation) => {
                info!(
                    instance_type = %instance_type,
                    profile = %weights.name,
                    best_zone = ?recommendation.best_zone,
                    confidence = recommendation.confidence,
                    "Smart zone ranking complete"
                );
                Ok(recommendation)
            }
            Err(e) => {
                warn!(
                    instance_type = %instance_type,
                    error = %e,
                    "Smart zone ranking failed, falling back to price-only ranking"
                );
                let mut recommendation = self.plain_ranking(instance_type, analysis.as_ref());
                recommendation.method = RankingMethod::PlainFallback;
                recommendation.confidence *= FALLBACK_CONFIDENCE_FACTOR;
                recommendation.insights.insert(
                    0,
                    "Zone capacity data unavailable, ranked by price history only".to_string(),
                );
                Ok(recommendation)
            }
        }
    }

    async fn smart_ranking(
        &self,
        instance_type: &str,
        weights: &WeightProfile,
        analysis: Option<&PriceAnalysis>,
    ) -> anyhow::Result<AzRecommendation> {
        let (zones, zone_provider_used) = self.load_zones(instance_type).await?;

        let mut scored = Vec::with_capacity(zones.len());
        let mut predicted = 0usize;
        for zone in &zones {
            let price = zone_price(analysis, zone, instance_type, self.cloud);
            if price.predicted {
                predicted += 1;
            }
            let capacity = self.capacity_for(instance_type, zone).await?;
            scored.push(score_zone(zone, capacity, &price, weights));
        }

        let ranked = rank_smart_zones(scored);
        let total = ranked.len().max(1) as f64;
        let signals = SmartSignals {
            zone_provider: zone_provider_used,
            real_prices: predicted < ranked.len(),
            capacity_provider: self.capacity_provider.is_some(),
            predicted_fraction: predicted as f64 / total,
        };
        let confidence = smart_confidence(&signals);

        let mut data_sources = vec![if zone_provider_used {
            "zone_provider".to_string()
        } else {
            "default_zones".to_string()
        }];
        data_sources.push(if signals.real_prices {
            "price_history_api".to_string()
        } else {
            "predicted_prices".to_string()
        });
        if signals.capacity_provider {
            data_sources.push("capacity_provider".to_string());
        }

        let price_differential_percent = match (ranked.first(), ranked.last()) {
            (Some(best), Some(worst)) if best.avg_price > 0.0 => {
                (worst.avg_price - best.avg_price) / best.avg_price * 100.0
            }
            _ => 0.0,
        };

        Ok(AzRecommendation {
            instance_type: instance_type.to_string(),
            region: self.region.clone(),
            method: RankingMethod::Smart,
            best_zone: ranked.first().map(|zone| zone.zone.clone()),
            next_best_zone: ranked.get(1).map(|zone| zone.zone.clone()),
            insights: smart_insights(&ranked, confidence),
            zones: ranked,
            price_differential_percent,
            confidence,
            data_sources,
            generated_at: chrono::Utc::now(),
        })
    }

    /// Available zones from the provider, else the default zone set
    async fn load_zones(&self, instance_type: &str) -> anyhow::Result<(Vec<ZoneInfo>, bool)> {
        let Some(provider) = self.zone_provider.as_ref().filter(|p| p.is_available()) else {
            return Ok((default_zones(&self.region, self.cloud), false));
        };

        let zones = timeout(self.config.call_timeout, provider.get_zones(instance_type))
            .await
            .map_err(|_| anyhow!("zone provider timed out"))?
            .context("zone provider failed")?;

        let available: Vec<ZoneInfo> = zones.into_iter().filter(|zone| zone.available).collect();
        if available.is_empty() {
            debug!(instance_type = %instance_type, "Zone provider returned no available zones");
            return Ok((default_zones(&self.region, self.cloud), false));
        }
        Ok((available, true))
    }

    async fn capacity_for(&self, instance_type: &str, zone: &ZoneInfo) -> anyhow::Result<f64> {
        let Some(provider) = &self.capacity_provider else {
            return Ok(zone.capacity);
        };
        let score = timeout(
            self.config.call_timeout,
            provider.get_capacity_score(instance_type, &zone.zone),
        )
        .await
        .map_err(|_| anyhow!("capacity provider timed out for {}", zone.zone))?
        .with_context(|| format!("capacity provider failed for {}", zone.zone))?;
        Ok(score.clamp(0.0, 100.0))
    }
}

/// Observed per-zone price, the regional average, or an estimate
fn zone_price(
    analysis: Option<&PriceAnalysis>,
    zone: &ZoneInfo,
    instance_type: &str,
    cloud: CloudProvider,
) -> ZonePrice {
    match analysis {
        Some(analysis) if analysis.zones.contains_key(&zone.zone) => {
            let observed = &analysis.zones[&zone.zone];
            ZonePrice {
                avg_price: observed.avg_price,
                current_price: Some(observed.current_price),
                volatility: observed.volatility,
                predicted: false,
            }
        }
        Some(analysis) if analysis.zones.is_empty() && analysis.avg_price > 0.0 => ZonePrice {
            avg_price: analysis.avg_price,
            current_price: None,
            volatility: analysis.volatility,
            predicted: false,
        },
        _ => ZonePrice::predicted(&zone.zone, instance_type, cloud),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PricePoint, TrendDirection, VolatilityRisk};
    use crate::prediction::{analyze_prices, HEURISTIC_CONFIDENCE};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct StaticHistory {
        available: bool,
        zoned: bool,
    }

    #[async_trait]
    impl PriceHistoryProvider for StaticHistory {
        fn is_available(&self) -> bool {
            self.available
        }

        fn region(&self) -> &str {
            "us-east-1"
        }

        async fn get_price_analysis(
            &self,
            instance_type: &str,
            _lookback_days: u32,
        ) -> anyhow::Result<Option<PriceAnalysis>> {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let points: Vec<PricePoint> = (0..48)
                .map(|i| PricePoint {
                    timestamp: start + ChronoDuration::hours(i),
                    price: if i % 2 == 0 { 0.040 } else { 0.060 },
                    zone: self.zoned.then(|| {
                        if i % 2 == 0 {
                            "us-east-1a".to_string()
                        } else {
                            "us-east-1b".to_string()
                        }
                    }),
                })
                .collect();
            Ok(analyze_prices(instance_type, "us-east-1", &points))
        }
    }

    /// Counts lookups against a zoned history
    struct CountingHistory {
        inner: StaticHistory,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceHistoryProvider for CountingHistory {
        fn is_available(&self) -> bool {
            true
        }

        fn region(&self) -> &str {
            "us-east-1"
        }

        async fn get_price_analysis(
            &self,
            instance_type: &str,
            lookback_days: u32,
        ) -> anyhow::Result<Option<PriceAnalysis>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.get_price_analysis(instance_type, lookback_days).await
        }
    }

    struct FailingHistory;

    #[async_trait]
    impl PriceHistoryProvider for FailingHistory {
        fn is_available(&self) -> bool {
            true
        }

        fn region(&self) -> &str {
            "us-east-1"
        }

        async fn get_price_analysis(
            &self,
            _instance_type: &str,
            _lookback_days: u32,
        ) -> anyhow::Result<Option<PriceAnalysis>> {
            Err(anyhow!("throttled"))
        }
    }

    struct Zones(Vec<ZoneInfo>);

    #[async_trait]
    impl ZoneProvider for Zones {
        fn is_available(&self) -> bool {
            true
        }

        async fn get_zones(&self, _instance_type: &str) -> anyhow::Result<Vec<ZoneInfo>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenZones;

    #[async_trait]
    impl ZoneProvider for BrokenZones {
        fn is_available(&self) -> bool {
            true
        }

        async fn get_zones(&self, _instance_type: &str) -> anyhow::Result<Vec<ZoneInfo>> {
            Err(anyhow!("access denied"))
        }
    }

    struct FixedCapacity(f64);

    #[async_trait]
    impl CapacityProvider for FixedCapacity {
        async fn get_capacity_score(&self, _instance_type: &str, zone: &str) -> anyhow::Result<f64> {
            Ok(if zone.ends_with('a') { self.0 } else { 30.0 })
        }
    }

    fn zone(name: &str, available: bool) -> ZoneInfo {
        ZoneInfo {
            zone: name.to_string(),
            available,
            restricted: false,
            capacity: 50.0,
        }
    }

    #[tokio::test]
    async fn test_unavailable_history_gives_heuristic_prediction() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws).with_price_history(
            Arc::new(StaticHistory {
                available: false,
                zoned: false,
            }),
        );
        let prediction = engine.predict_price("m5.large").await;
        assert_eq!(prediction.confidence, HEURISTIC_CONFIDENCE);
        assert_eq!(prediction.trend, TrendDirection::Unknown);
        assert_eq!(prediction.volatility_risk, VolatilityRisk::Unknown);
    }

    #[tokio::test]
    async fn test_provider_error_gives_heuristic_prediction() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws)
            .with_price_history(Arc::new(FailingHistory));
        let prediction = engine.predict_price("m5.large").await;
        assert_eq!(prediction.method, "heuristic");
    }

    #[tokio::test]
    async fn test_live_history_prediction() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws).with_price_history(
            Arc::new(StaticHistory {
                available: true,
                zoned: false,
            }),
        );
        let prediction = engine.predict_price("m5.large").await;
        assert_eq!(prediction.method, "linear_regression_7day");
        assert_eq!(prediction.data_points, 48);
        assert_eq!(prediction.optimal_launch_window, "00:00-02:00 UTC");
    }

    #[tokio::test]
    async fn test_plain_ranking_simulates_without_history() {
        let engine = PredictionEngine::new("us-west-2", CloudProvider::Aws);
        let recommendation = engine.recommend_az("m5.large").await;

        assert_eq!(recommendation.method, RankingMethod::Plain);
        assert_eq!(recommendation.zones.len(), 4);
        assert_eq!(recommendation.zones[0].combined_score, 100.0);
        assert!(recommendation.zones.iter().all(|zone| zone.price_predicted));
        assert!(recommendation.zones.iter().all(|zone| zone.current_price.is_none()));
        assert!(recommendation.confidence <= 0.5);
    }

    #[tokio::test]
    async fn test_plain_ranking_uses_real_zone_data() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws).with_price_history(
            Arc::new(StaticHistory {
                available: true,
                zoned: true,
            }),
        );
        let recommendation = engine.recommend_az("m5.large").await;

        assert_eq!(recommendation.zones.len(), 2);
        assert_eq!(recommendation.best_zone.as_deref(), Some("us-east-1a"));
        assert!(recommendation.zones.iter().all(|zone| !zone.price_predicted));
        assert_eq!(recommendation.zones[0].current_price, Some(0.040));
        assert!(recommendation.confidence > 0.5);
    }

    #[tokio::test]
    async fn test_smart_ranking_rejects_zero_weights() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws)
            .with_zone_provider(Arc::new(BrokenZones));
        let zero = WeightProfile::custom("zero", 0.0, 0.0, 0.0, 0.0);
        let err = engine.smart_recommend_az("m5.large", &zero).await.unwrap_err();
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_smart_ranking_heuristic_confidence() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws);
        let recommendation = engine
            .smart_recommend_az("m5.large", &WeightProfile::balanced())
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::Smart);
        assert_eq!(recommendation.zones.len(), 3);
        assert!(recommendation.zones.iter().all(|zone| zone.price_predicted));
        assert!(recommendation.confidence <= 0.5);
        for (i, zone) in recommendation.zones.iter().enumerate() {
            assert_eq!(zone.rank, i + 1);
        }
    }

    #[tokio::test]
    async fn test_smart_ranking_with_live_signals() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws)
            .with_price_history(Arc::new(StaticHistory {
                available: true,
                zoned: true,
            }))
            .with_zone_provider(Arc::new(Zones(vec![
                zone("us-east-1a", true),
                zone("us-east-1b", true),
                zone("us-east-1f", false),
            ])))
            .with_capacity_provider(Arc::new(FixedCapacity(95.0)));

        let recommendation = engine
            .smart_recommend_az("m5.large", &WeightProfile::high_capacity())
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::Smart);
        assert_eq!(recommendation.zones.len(), 2);
        assert_eq!(recommendation.best_zone.as_deref(), Some("us-east-1a"));
        assert!(recommendation.confidence > 0.5);
        assert!(recommendation.data_sources.contains(&"capacity_provider".to_string()));
    }

    #[tokio::test]
    async fn test_zone_provider_failure_falls_back() {
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws)
            .with_zone_provider(Arc::new(BrokenZones));
        let recommendation = engine
            .smart_recommend_az("m5.large", &WeightProfile::balanced())
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::PlainFallback);
        assert!(recommendation.confidence <= 0.5);
        assert!(recommendation.insights[0].contains("unavailable"));
        assert_eq!(recommendation.zones.len(), 6);
    }

    #[tokio::test]
    async fn test_fallback_reuses_fetched_analysis() {
        let history = Arc::new(CountingHistory {
            inner: StaticHistory {
                available: true,
                zoned: true,
            },
            calls: AtomicUsize::new(0),
        });
        let engine = PredictionEngine::new("us-east-1", CloudProvider::Aws)
            .with_price_history(history.clone())
            .with_zone_provider(Arc::new(BrokenZones));

        let recommendation = engine
            .smart_recommend_az("m5.large", &WeightProfile::balanced())
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::PlainFallback);
        assert_eq!(recommendation.zones.len(), 2);
        assert!(recommendation.zones.iter().all(|zone| !zone.price_predicted));
        assert_eq!(history.calls.load(AtomicOrdering::SeqCst), 1);
    }
}
