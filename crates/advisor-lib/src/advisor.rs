//! Advisor service
//!
//! Wires the providers, cache and engines together behind the operations
//! the HTTP layer exposes. Live price, zone and capacity adapters are bound
//! to a single region; requests for other regions run on heuristics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::cache::{CacheManager, CacheStats};
use crate::error::{AdvisorError, Result};
use crate::family::available_families;
use crate::models::{
    AnalysisReport, AzRecommendation, CloudProvider, InstanceCandidate, InstanceSpecs,
    PricePrediction, RankedInstance, RankingMethod, UsageRequirements,
};
use crate::observability::{AdvisorMetrics, StructuredLogger};
use crate::prediction::{
    PredictionConfig, PredictionEngine, WeightProfile, DEFAULT_CALL_TIMEOUT, DEFAULT_LOOKBACK_DAYS,
};
use crate::providers::{
    CachedPriceHistory, CapacityProvider, InstanceSpecsProvider, PriceHistoryProvider,
    SpotDataProvider, ZoneProvider,
};
use crate::scoring::{EligibilityFilter, HistoricalPriceStrategy, ScoringConfig, ScoringEngine};

/// Default budget for a whole recommendation request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of zones returned per zone recommendation
pub const DEFAULT_AZ_RECOMMENDATIONS: usize = 2;

#[derive(Debug, Clone)]
pub struct AdvisorOptions {
    pub lookback_days: u32,
    /// Bound on each provider call
    pub call_timeout: Duration,
    /// Deadline for a whole recommendation request
    pub request_timeout: Duration,
    pub scoring: ScoringConfig,
    /// Zones kept in a zone recommendation, 0 keeps all
    pub az_recommendations: usize,
}

impl Default for AdvisorOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            scoring: ScoringConfig::default(),
            az_recommendations: DEFAULT_AZ_RECOMMENDATIONS,
        }
    }
}

/// Cache counters plus freshness information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub ttl_seconds: u64,
    pub last_refresh: DateTime<Utc>,
}

pub struct Advisor {
    cloud: CloudProvider,
    region: String,
    spot_data: Arc<dyn SpotDataProvider>,
    specs: Option<Arc<dyn InstanceSpecsProvider>>,
    price_history: Option<Arc<dyn PriceHistoryProvider>>,
    zone_provider: Option<Arc<dyn ZoneProvider>>,
    capacity_provider: Option<Arc<dyn CapacityProvider>>,
    cache: Arc<CacheManager>,
    options: AdvisorOptions,
    metrics: AdvisorMetrics,
    logger: StructuredLogger,
}

impl Advisor {
    pub fn new(
        cloud: CloudProvider,
        region: impl Into<String>,
        spot_data: Arc<dyn SpotDataProvider>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            cloud,
            region: region.into(),
            spot_data,
            specs: None,
            price_history: None,
            zone_provider: None,
            capacity_provider: None,
            cache,
            options: AdvisorOptions::default(),
            metrics: AdvisorMetrics::new(),
            logger: StructuredLogger::new("spot-advisor"),
        }
    }

    pub fn with_specs_provider(mut self, provider: Arc<dyn InstanceSpecsProvider>) -> Self {
        self.specs = Some(provider);
        self
    }

    /// Attach live price history; analyses are memoized in the shared cache
    pub fn with_price_history(mut self, provider: Arc<dyn PriceHistoryProvider>) -> Self {
        if provider.region() != self.region {
            warn!(
                advisor_region = %self.region,
                provider_region = %provider.region(),
                "Price history region differs from the advisor region"
            );
        }
        let cached = CachedPriceHistory::new(provider, Arc::clone(&self.cache));
        self.price_history = Some(Arc::new(cached));
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

    pub fn with_options(mut self, options: AdvisorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cloud(&self) -> CloudProvider {
        self.cloud
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn has_price_history(&self) -> bool {
        self.price_history.as_ref().is_some_and(|p| p.is_available())
    }

    pub fn has_zone_data(&self) -> bool {
        self.zone_provider.as_ref().is_some_and(|p| p.is_available())
    }

    /// Rank the instance types matching `requirements`.
    ///
    /// Fails on invalid requirements, a spot data outage, an empty eligible
    /// set, or a deadline that passes before any candidate is enhanced.
    pub async fn recommend(&self, requirements: UsageRequirements) -> Result<AnalysisReport> {
        let started = std::time::Instant::now();
        let result = self.run_recommendation(requirements, started).await;

        let outcome = match &result {
            Ok(report) if report.deadline_exceeded => "partial",
            Ok(_) => "ok",
            Err(_) => "error",
        };
        self.metrics.inc_rankings(outcome);
        self.metrics
            .observe_ranking_latency(started.elapsed().as_secs_f64());
        self.metrics.set_cache_stats(&self.cache.stats());
        result
    }

    async fn run_recommendation(
        &self,
        requirements: UsageRequirements,
        started: std::time::Instant,
    ) -> Result<AnalysisReport> {
        requirements.validate()?;
        let deadline = Instant::now() + self.options.request_timeout;

        let spot_data = self.spot_data(&requirements).await?;
        let candidates = self.fill_specs(spot_data.as_ref().clone()).await;
        let total_analyzed = candidates.len();

        let filtered = EligibilityFilter::new(self.cloud).filter(candidates, &requirements);
        let filtered_out = filtered.rejected.len();
        debug!(
            region = %requirements.region,
            eligible = filtered.eligible.len(),
            rejections = ?filtered.rejection_counts(),
            "Candidates filtered"
        );

        let types: Vec<String> = filtered
            .eligible
            .iter()
            .map(|c| c.instance_type().to_string())
            .collect();
        let strategy = self.historical_strategy(&requirements.region, &types).await;
        let engine = ScoringEngine::new(vec![Arc::new(strategy)])
            .with_config(self.options.scoring.clone());

        let mut outcome = engine
            .rank(&requirements, filtered.eligible, Some(deadline))
            .await?;

        if outcome.skipped_strategies > 0 {
            self.metrics.add_strategy_failures(outcome.skipped_strategies);
            self.logger
                .log_strategy_skipped(&requirements.region, outcome.skipped_strategies);
        }

        let eligible = outcome.instances.len();
        if requirements.top_n > 0 {
            outcome.instances.truncate(requirements.top_n);
        }

        let summary = summarize(
            &requirements.region,
            total_analyzed,
            eligible,
            filtered_out,
            &outcome.instances,
            outcome.deadline_exceeded,
        );

        self.logger.log_ranking(
            &requirements.region,
            total_analyzed,
            filtered_out,
            outcome.instances.len(),
            outcome.instances.first().map(|r| r.instance_type()),
            outcome.deadline_exceeded,
            started.elapsed().as_millis() as u64,
        );

        Ok(AnalysisReport {
            region: requirements.region.clone(),
            cloud: self.cloud,
            total_analyzed,
            filtered_out,
            strategies: outcome.strategies,
            deadline_exceeded: outcome.deadline_exceeded,
            top_instances: outcome.instances,
            summary,
            requirements,
            analyzed_at: Utc::now(),
        })
    }

    /// Price forecast for one instance type
    pub async fn predict_price(
        &self,
        instance_type: &str,
        region: Option<&str>,
    ) -> Result<PricePrediction> {
        if instance_type.trim().is_empty() {
            return Err(AdvisorError::invalid("instance_type", "must not be empty"));
        }
        let started = std::time::Instant::now();
        let engine = self.prediction_engine(region.unwrap_or(&self.region));
        let prediction = engine.predict_price(instance_type).await;
        self.metrics
            .observe_prediction_latency(started.elapsed().as_secs_f64());
        Ok(prediction)
    }

    /// Rank availability zones; `weights` selects the multi-factor path
    pub async fn recommend_zones(
        &self,
        instance_type: &str,
        region: Option<&str>,
        weights: Option<&WeightProfile>,
    ) -> Result<AzRecommendation> {
        if instance_type.trim().is_empty() {
            return Err(AdvisorError::invalid("instance_type", "must not be empty"));
        }
        let started = std::time::Instant::now();
        let engine = self.prediction_engine(region.unwrap_or(&self.region));

        let mut recommendation = match weights {
            Some(weights) => engine.smart_recommend_az(instance_type, weights).await?,
            None => engine.recommend_az(instance_type).await,
        };
        if self.options.az_recommendations > 0 {
            recommendation.zones.truncate(self.options.az_recommendations);
        }

        let method = method_label(recommendation.method);
        if recommendation.method == RankingMethod::PlainFallback {
            self.metrics.inc_az_fallbacks();
        }
        self.metrics
            .observe_az_latency(method, started.elapsed().as_secs_f64());
        self.logger.log_az_recommendation(
            instance_type,
            &recommendation.region,
            method,
            recommendation.best_zone.as_deref(),
            recommendation.confidence,
        );
        Ok(recommendation)
    }

    /// Families present in the catalog for the advisor's region
    pub async fn families(&self) -> Result<Vec<String>> {
        let requirements = UsageRequirements {
            region: self.region.clone(),
            ..Default::default()
        };
        let spot_data = self.spot_data(&requirements).await?;
        Ok(available_families(
            spot_data.iter().map(|c| c.instance_type()),
            self.cloud,
        ))
    }

    pub fn cache_report(&self) -> CacheReport {
        let stats = self.cache.stats();
        self.metrics.set_cache_stats(&stats);
        CacheReport {
            stats,
            ttl_seconds: self.cache.ttl().as_secs(),
            last_refresh: self.cache.last_refresh(),
        }
    }

    /// Drop every cached provider result
    pub fn refresh_cache(&self) -> usize {
        let removed = self.cache.refresh();
        self.logger.log_cache_refresh(removed);
        self.metrics.set_cache_stats(&self.cache.stats());
        removed
    }

    /// Spot data for a region and OS, served from cache when fresh
    async fn spot_data(
        &self,
        requirements: &UsageRequirements,
    ) -> Result<Arc<Vec<InstanceCandidate>>> {
        let key = format!(
            "spot_data:{}:{}",
            requirements.region,
            requirements.os.as_str()
        );
        if let Some(cached) = self.cache.get::<Vec<InstanceCandidate>>(&key) {
            return Ok(cached);
        }

        let data = timeout(
            self.options.call_timeout,
            self.spot_data.get_spot_data(requirements),
        )
        .await
        .map_err(|_| AdvisorError::provider("spot_data", "request timed out"))?
        .map_err(|e| AdvisorError::provider("spot_data", format!("{:#}", e)))?;

        info!(
            region = %requirements.region,
            instances = data.len(),
            "Fetched spot advisory data"
        );
        let data = Arc::new(data);
        self.cache.set_shared(key, Arc::clone(&data), self.cache.ttl());
        Ok(data)
    }

    /// Replace incomplete specs (vCPU 0) from the specs catalog
    async fn fill_specs(&self, candidates: Vec<InstanceCandidate>) -> Vec<InstanceCandidate> {
        if candidates.iter().all(|c| c.specs.vcpu > 0) {
            return candidates;
        }
        let Some(catalog) = self.specs_catalog().await else {
            return candidates;
        };

        candidates
            .into_iter()
            .map(|mut candidate| {
                if candidate.specs.vcpu == 0 {
                    if let Some(specs) = catalog.get(candidate.instance_type()) {
                        let cloud = candidate.specs.cloud;
                        candidate.specs = specs.clone();
                        candidate.specs.cloud = cloud;
                    }
                }
                candidate
            })
            .collect()
    }

    async fn specs_catalog(&self) -> Option<Arc<HashMap<String, InstanceSpecs>>> {
        let provider = self.specs.as_ref()?;
        let key = format!("instance_specs:{}", self.cloud);
        if let Some(cached) = self.cache.get::<HashMap<String, InstanceSpecs>>(&key) {
            return Some(cached);
        }

        let specs = match timeout(self.options.call_timeout, provider.get_all_instance_specs()).await {
            Ok(Ok(specs)) => specs,
            Ok(Err(e)) => {
                warn!(error = %e, "Instance specs lookup failed, keeping incomplete specs");
                return None;
            }
            Err(_) => {
                warn!("Instance specs lookup timed out, keeping incomplete specs");
                return None;
            }
        };

        let catalog: HashMap<String, InstanceSpecs> = specs
            .into_iter()
            .map(|specs| (specs.instance_type.clone(), specs))
            .collect();
        let catalog = Arc::new(catalog);
        self.cache.set_shared(key, Arc::clone(&catalog), self.cache.ttl());
        Some(catalog)
    }

    /// Price history bound to `region`, if one is attached
    fn price_history_for(&self, region: &str) -> Option<Arc<dyn PriceHistoryProvider>> {
        self.price_history
            .as_ref()
            .filter(|provider| provider.region() == region)
            .cloned()
    }

    /// Strategy with analyses for every eligible type fetched in one batch
    async fn historical_strategy(&self, region: &str, types: &[String]) -> HistoricalPriceStrategy {
        let Some(provider) = self.price_history_for(region) else {
            return HistoricalPriceStrategy::heuristic();
        };

        let mut prefetched = HashMap::new();
        if provider.is_available() && !types.is_empty() {
            let batch = provider.get_batch_price_analysis(types, self.options.lookback_days);
            match timeout(self.options.call_timeout, batch).await {
                Ok(Ok(analyses)) => prefetched = analyses,
                Ok(Err(e)) => warn!(region = %region, error = %e, "Batch price analysis failed"),
                Err(_) => warn!(region = %region, "Batch price analysis timed out"),
            }
        }
        debug!(
            region = %region,
            requested = types.len(),
            prefetched = prefetched.len(),
            "Prefetched price analyses"
        );

        HistoricalPriceStrategy::with_price_history(provider)
            .with_prefetched(prefetched)
            .with_lookback_days(self.options.lookback_days)
            .with_call_timeout(self.options.call_timeout)
    }

    fn prediction_engine(&self, region: &str) -> PredictionEngine {
        let mut engine = PredictionEngine::new(region, self.cloud).with_config(PredictionConfig {
            lookback_days: self.options.lookback_days,
            call_timeout: self.options.call_timeout,
        });
        if let Some(provider) = self.price_history_for(region) {
            engine = engine.with_price_history(provider);
        }
        if region == self.region {
            if let Some(provider) = &self.zone_provider {
                engine = engine.with_zone_provider(Arc::clone(provider));
            }
            if let Some(provider) = &self.capacity_provider {
                engine = engine.with_capacity_provider(Arc::clone(provider));
            }
        }
        engine
    }
}

fn method_label(method: RankingMethod) -> &'static str {
    match method {
        RankingMethod::Smart => "smart",
        RankingMethod::Plain => "plain",
        RankingMethod::PlainFallback => "plain_fallback",
    }
}

fn summarize(
    region: &str,
    total: usize,
    eligible: usize,
    filtered_out: usize,
    top: &[RankedInstance],
    deadline_exceeded: bool,
) -> String {
    let mut summary = format!(
        "Analyzed {} instance types in {}: {} eligible, {} filtered out.",
        total, region, eligible, filtered_out
    );
    if let Some(best) = top.first() {
        summary.push_str(&format!(
            " Top pick: {} (score {:.2}, {}% savings, interruption {}).",
            best.instance_type(),
            best.final_score,
            best.candidate.advisory.savings_percent,
            best.candidate.advisory.interruption.label()
        ));
    }
    if deadline_exceeded {
        summary.push_str(" Some candidates were ranked on advisory data only.");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RecordedPriceHistory, StaticCatalog};
    use crate::models::{PricePoint, TrendDirection, ZoneInfo};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSpotData {
        calls: AtomicUsize,
        instances: Vec<InstanceCandidate>,
    }

    #[async_trait]
    impl SpotDataProvider for CountingSpotData {
        async fn get_spot_data(
            &self,
            _requirements: &UsageRequirements,
        ) -> anyhow::Result<Vec<InstanceCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.instances.clone())
        }
    }

    struct DownSpotData;

    #[async_trait]
    impl SpotDataProvider for DownSpotData {
        async fn get_spot_data(
            &self,
            _requirements: &UsageRequirements,
        ) -> anyhow::Result<Vec<InstanceCandidate>> {
            anyhow::bail!("advisor feed unreachable")
        }
    }

    fn builtin_advisor() -> Advisor {
        let catalog = Arc::new(StaticCatalog::builtin());
        Advisor::new(
            CloudProvider::Aws,
            "us-east-1",
            catalog.clone(),
            Arc::new(CacheManager::default()),
        )
        .with_specs_provider(catalog)
    }

    fn recorded_history() -> RecordedPriceHistory {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let mut series = HashMap::new();
        let points = (0..48)
            .flat_map(|i| {
                let timestamp = start + ChronoDuration::hours(i);
                [("us-east-1a", 0.040), ("us-east-1b", 0.050)].map(|(zone, price)| PricePoint {
                    timestamp,
                    price,
                    zone: Some(zone.to_string()),
                })
            })
            .collect::<Vec<_>>();
        series.insert("m6i.large".to_string(), points);

        let mut zones = HashMap::new();
        zones.insert(
            "m6i.large".to_string(),
            vec![
                ZoneInfo {
                    zone: "us-east-1a".to_string(),
                    available: true,
                    restricted: false,
                    capacity: 80.0,
                },
                ZoneInfo {
                    zone: "us-east-1b".to_string(),
                    available: true,
                    restricted: false,
                    capacity: 60.0,
                },
            ],
        );
        RecordedPriceHistory::new("us-east-1", series).with_zones(zones)
    }

    #[tokio::test]
    async fn test_recommend_builtin_catalog() {
        let advisor = builtin_advisor();
        let report = advisor
            .recommend(UsageRequirements::default())
            .await
            .unwrap();

        // t3.large is burstable and g5.xlarge carries an unrequested GPU
        assert_eq!(report.total_analyzed, 23);
        assert_eq!(report.filtered_out, 2);
        assert_eq!(report.top_instances.len(), 10);
        assert_eq!(report.strategies, vec!["historical_price_analysis".to_string()]);
        assert!(!report.deadline_exceeded);
        for (i, instance) in report.top_instances.iter().enumerate() {
            assert_eq!(instance.rank, i + 1);
            assert_ne!(instance.instance_type(), "t3.large");
        }
        assert!(report.summary.starts_with("Analyzed 23 instance types in us-east-1"));
    }

    #[tokio::test]
    async fn test_invalid_requirements_rejected() {
        let advisor = builtin_advisor();
        let err = advisor
            .recommend(UsageRequirements {
                min_vcpu: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_nothing_eligible_is_an_error() {
        let advisor = builtin_advisor();
        let err = advisor
            .recommend(UsageRequirements {
                min_vcpu: 512,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::NoCandidates));
    }

    #[tokio::test]
    async fn test_spot_data_outage_is_a_provider_error() {
        let advisor = Advisor::new(
            CloudProvider::Aws,
            "us-east-1",
            Arc::new(DownSpotData),
            Arc::new(CacheManager::default()),
        );
        let err = advisor
            .recommend(UsageRequirements::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::Provider {
                provider: "spot_data",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_spot_data_is_cached_and_specs_filled() {
        let mut incomplete = InstanceCandidate::new(
            InstanceSpecs::new("m6i.xlarge", 0, 0.0),
            66,
            crate::models::InterruptionFrequency::VeryLow,
        );
        incomplete.specs.cloud = CloudProvider::Aws;
        let provider = Arc::new(CountingSpotData {
            calls: AtomicUsize::new(0),
            instances: vec![incomplete],
        });
        let cache = Arc::new(CacheManager::default());
        let advisor = Advisor::new(CloudProvider::Aws, "us-east-1", provider.clone(), cache.clone())
            .with_specs_provider(Arc::new(StaticCatalog::builtin()));

        let first = advisor.recommend(UsageRequirements::default()).await.unwrap();
        let second = advisor.recommend(UsageRequirements::default()).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.top_instances.len(), 1);
        assert_eq!(first.top_instances[0].candidate.specs.vcpu, 4);
        assert_eq!(first.top_instances, second.top_instances);
        assert!(cache.keys().contains(&"spot_data:us-east-1:Linux".to_string()));
    }

    #[tokio::test]
    async fn test_prediction_uses_history_only_in_its_region() {
        let advisor = builtin_advisor().with_price_history(Arc::new(recorded_history()));

        let live = advisor.predict_price("m6i.large", None).await.unwrap();
        assert_eq!(live.method, crate::prediction::REGRESSION_METHOD);
        assert_eq!(live.data_points, 96);

        let elsewhere = advisor
            .predict_price("m6i.large", Some("eu-west-1"))
            .await
            .unwrap();
        assert_eq!(elsewhere.trend, TrendDirection::Unknown);
        assert_eq!(elsewhere.confidence, crate::prediction::HEURISTIC_CONFIDENCE);

        assert!(advisor.predict_price(" ", None).await.is_err());
    }

    #[tokio::test]
    async fn test_smart_zones_with_recorded_data() {
        let history = Arc::new(recorded_history());
        let advisor = builtin_advisor()
            .with_price_history(history.clone())
            .with_zone_provider(history);

        let recommendation = advisor
            .recommend_zones("m6i.large", None, Some(&WeightProfile::balanced()))
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::Smart);
        assert_eq!(recommendation.best_zone.as_deref(), Some("us-east-1a"));
        assert!(recommendation.confidence > 0.5);
        assert_eq!(recommendation.zones.len(), 2);
        assert_eq!(recommendation.zones[0].current_price, Some(0.040));
    }

    #[tokio::test]
    async fn test_plain_zones_truncated_to_configured_count() {
        let advisor = builtin_advisor();
        let recommendation = advisor
            .recommend_zones("m5.large", None, None)
            .await
            .unwrap();

        assert_eq!(recommendation.method, RankingMethod::Plain);
        assert_eq!(recommendation.zones.len(), DEFAULT_AZ_RECOMMENDATIONS);
        assert_eq!(recommendation.zones[0].rank, 1);
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let advisor = builtin_advisor();
        let zero = WeightProfile::custom("zero", 0.0, 0.0, 0.0, 0.0);
        let err = advisor
            .recommend_zones("m5.large", None, Some(&zero))
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput { field: "weights", .. }));
    }

    #[tokio::test]
    async fn test_families_and_cache_refresh() {
        let advisor = builtin_advisor();
        let families = advisor.families().await.unwrap();
        assert_eq!(families, vec!["c", "g", "i", "m", "r", "t"]);

        let report = advisor.cache_report();
        assert_eq!(report.stats.items, 1);
        assert_eq!(report.ttl_seconds, 7200);

        assert_eq!(advisor.refresh_cache(), 1);
        assert_eq!(advisor.cache_report().stats.items, 0);
    }
}
