//! Observability infrastructure for the advisor
//!
//! Provides:
//! - Prometheus metrics (ranking, prediction and zone latency, strategy failures, cache size)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::cache::CacheStats;

/// Histogram buckets for request-level latencies (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    ranking_latency_seconds: Histogram,
    prediction_latency_seconds: Histogram,
    az_latency_seconds: HistogramVec,
    rankings_total: IntCounterVec,
    strategy_failures: IntCounter,
    az_fallbacks: IntCounter,
    rate_limited_requests: IntCounter,
    cache_hits: IntGauge,
    cache_misses: IntGauge,
    cache_items: IntGauge,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            ranking_latency_seconds: register_histogram!(
                "spot_advisor_ranking_latency_seconds",
                "Time spent producing an instance recommendation report",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register ranking_latency_seconds"),

            prediction_latency_seconds: register_histogram!(
                "spot_advisor_prediction_latency_seconds",
                "Time spent forecasting spot prices",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            az_latency_seconds: register_histogram_vec!(
                "spot_advisor_az_latency_seconds",
                "Time spent ranking availability zones",
                &["method"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register az_latency_seconds"),

            rankings_total: register_int_counter_vec!(
                "spot_advisor_rankings_total",
                "Recommendation requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register rankings_total"),

            strategy_failures: register_int_counter!(
                "spot_advisor_strategy_failures_total",
                "Scoring strategy computations skipped after an error or timeout"
            )
            .expect("Failed to register strategy_failures"),

            az_fallbacks: register_int_counter!(
                "spot_advisor_az_fallbacks_total",
                "Smart zone rankings answered by the price-only path"
            )
            .expect("Failed to register az_fallbacks"),

            rate_limited_requests: register_int_counter!(
                "spot_advisor_rate_limited_requests_total",
                "Requests rejected by the rate limiter"
            )
            .expect("Failed to register rate_limited_requests"),

            cache_hits: register_int_gauge!(
                "spot_advisor_cache_hits",
                "Cache hits since start"
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_gauge!(
                "spot_advisor_cache_misses",
                "Cache misses since start"
            )
            .expect("Failed to register cache_misses"),

            cache_items: register_int_gauge!(
                "spot_advisor_cache_items",
                "Entries currently held in the cache"
            )
            .expect("Failed to register cache_items"),
        }
    }
}

/// Advisor metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new)
    }

    pub fn observe_ranking_latency(&self, duration_secs: f64) {
        self.inner().ranking_latency_seconds.observe(duration_secs);
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Record a zone ranking, labelled by the method that answered
    pub fn observe_az_latency(&self, method: &str, duration_secs: f64) {
        self.inner()
            .az_latency_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    /// Count a recommendation request (`ok`, `partial` or `error`)
    pub fn inc_rankings(&self, outcome: &str) {
        self.inner()
            .rankings_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn add_strategy_failures(&self, count: usize) {
        self.inner().strategy_failures.inc_by(count as u64);
    }

    pub fn inc_az_fallbacks(&self) {
        self.inner().az_fallbacks.inc();
    }

    pub fn inc_rate_limited(&self) {
        self.inner().rate_limited_requests.inc();
    }

    /// Mirror cache counters into the gauges
    pub fn set_cache_stats(&self, stats: &CacheStats) {
        let inner = self.inner();
        inner.cache_hits.set(stats.hits as i64);
        inner.cache_misses.set(stats.misses as i64);
        inner.cache_items.set(stats.items as i64);
    }
}

/// Structured logger for advisor events
///
/// Emits one record per service-level event with a stable `event` field.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, cloud: &str, region: &str, catalog_size: usize) {
        info!(
            event = "advisor_started",
            service = %self.service,
            version = %version,
            cloud = %cloud,
            region = %region,
            catalog_size = catalog_size,
            "Spot advisor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "advisor_shutdown",
            service = %self.service,
            reason = %reason,
            "Spot advisor shutting down"
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_ranking(
        &self,
        region: &str,
        analyzed: usize,
        filtered_out: usize,
        returned: usize,
        top_instance: Option<&str>,
        deadline_exceeded: bool,
        duration_ms: u64,
    ) {
        if deadline_exceeded {
            warn!(
                event = "ranking_completed",
                service = %self.service,
                region = %region,
                analyzed = analyzed,
                filtered_out = filtered_out,
                returned = returned,
                top_instance = ?top_instance,
                deadline_exceeded = true,
                duration_ms = duration_ms,
                "Ranking completed with partial enhancement"
            );
        } else {
            info!(
                event = "ranking_completed",
                service = %self.service,
                region = %region,
                analyzed = analyzed,
                filtered_out = filtered_out,
                returned = returned,
                top_instance = ?top_instance,
                deadline_exceeded = false,
                duration_ms = duration_ms,
                "Ranking completed"
            );
        }
    }

    pub fn log_az_recommendation(
        &self,
        instance_type: &str,
        region: &str,
        method: &str,
        best_zone: Option<&str>,
        confidence: f64,
    ) {
        info!(
            event = "az_recommendation",
            service = %self.service,
            instance_type = %instance_type,
            region = %region,
            method = %method,
            best_zone = ?best_zone,
            confidence = confidence,
            "Availability zones ranked"
        );
    }

    pub fn log_strategy_skipped(&self, region: &str, skipped: usize) {
        warn!(
            event = "strategy_skipped",
            service = %self.service,
            region = %region,
            skipped = skipped,
            "Scoring strategies skipped for some candidates"
        );
    }

    pub fn log_cache_refresh(&self, removed: usize) {
        info!(
            event = "cache_refreshed",
            service = %self.service,
            removed = removed,
            "Cache refreshed on request"
        );
    }

    pub fn log_rate_limited(&self, client_id: &str, path: &str) {
        warn!(
            event = "rate_limited",
            service = %self.service,
            client_id = %client_id,
            path = %path,
            "Request rejected by rate limiter"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisor_metrics_creation() {
        // Metrics live in the process-global registry; handles share them
        let metrics = AdvisorMetrics::new();
        let other = metrics.clone();

        metrics.observe_ranking_latency(0.02);
        metrics.observe_prediction_latency(0.001);
        metrics.observe_az_latency("smart", 0.004);
        metrics.inc_rankings("ok");
        metrics.add_strategy_failures(2);
        other.inc_az_fallbacks();
        other.inc_rate_limited();
        other.set_cache_stats(&CacheStats {
            hits: 3,
            misses: 1,
            items: 2,
        });

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "spot_advisor_cache_items"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("spot-advisor");
        assert_eq!(logger.service, "spot-advisor");
    }
}
