//! Interfaces to external data adapters
//!
//! Adapters for cloud APIs implement these traits. Every provider is
//! optional from the engines' point of view: callers check
//! `is_available()` before asking for data and treat errors as a signal to
//! fall back to heuristics.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::CacheManager;
use crate::models::{InstanceCandidate, InstanceSpecs, PriceAnalysis, UsageRequirements, ZoneInfo};

/// Advisory savings/interruption data joined with specs
#[async_trait]
pub trait SpotDataProvider: Send + Sync {
    async fn get_spot_data(&self, requirements: &UsageRequirements) -> Result<Vec<InstanceCandidate>>;
}

/// Instance type hardware catalog
#[async_trait]
pub trait InstanceSpecsProvider: Send + Sync {
    async fn get_all_instance_specs(&self) -> Result<Vec<InstanceSpecs>>;
}

/// Live spot price history for one region
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Whether credentials/connectivity allow real data to be fetched
    fn is_available(&self) -> bool;

    fn region(&self) -> &str;

    /// Analysis for one instance type, `None` when the type has no history
    async fn get_price_analysis(
        &self,
        instance_type: &str,
        lookback_days: u32,
    ) -> Result<Option<PriceAnalysis>>;

    /// Analyses for several instance types; types without history are omitted
    async fn get_batch_price_analysis(
        &self,
        instance_types: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, PriceAnalysis>> {
        let mut analyses = HashMap::new();
        for instance_type in instance_types {
            if let Some(analysis) = self.get_price_analysis(instance_type, lookback_days).await? {
                analyses.insert(instance_type.clone(), analysis);
            }
        }
        Ok(analyses)
    }
}

/// Availability zones offering an instance type
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    fn is_available(&self) -> bool;

    async fn get_zones(&self, instance_type: &str) -> Result<Vec<ZoneInfo>>;
}

/// Capacity signal (0-100) for an instance type in a zone
#[async_trait]
pub trait CapacityProvider: Send + Sync {
    async fn get_capacity_score(&self, instance_type: &str, zone: &str) -> Result<f64>;
}

/// Price history provider that memoizes analyses in the shared cache
pub struct CachedPriceHistory {
    inner: Arc<dyn PriceHistoryProvider>,
    cache: Arc<CacheManager>,
    ttl: Duration,
}

impl CachedPriceHistory {
    pub fn new(inner: Arc<dyn PriceHistoryProvider>, cache: Arc<CacheManager>) -> Self {
        let ttl = cache.ttl();
        Self { inner, cache, ttl }
    }

    /// Cache key for an analysis: instance type, region and lookback window
    pub fn cache_key(region: &str, instance_type: &str, lookback_days: u32) -> String {
        format!("price_analysis:{}:{}:{}", region, instance_type, lookback_days)
    }
}

#[async_trait]
impl PriceHistoryProvider for CachedPriceHistory {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn region(&self) -> &str {
        self.inner.region()
    }

    async fn get_price_analysis(
        &self,
        instance_type: &str,
        lookback_days: u32,
    ) -> Result<Option<PriceAnalysis>> {
        let key = Self::cache_key(self.region(), instance_type, lookback_days);
        if let Some(cached) = self.cache.get::<PriceAnalysis>(&key) {
            debug!(instance_type = %instance_type, "Price analysis served from cache");
            return Ok(Some((*cached).clone()));
        }

        let analysis = self.inner.get_price_analysis(instance_type, lookback_days).await?;
        if let Some(analysis) = &analysis {
            self.cache.set(key, analysis.clone(), self.ttl);
        }
        Ok(analysis)
    }

    async fn get_batch_price_analysis(
        &self,
        instance_types: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, PriceAnalysis>> {
        let mut analyses = HashMap::new();
        let mut missing = Vec::new();
        for instance_type in instance_types {
            let key = Self::cache_key(self.region(), instance_type, lookback_days);
            match self.cache.get::<PriceAnalysis>(&key) {
                Some(cached) => {
                    analyses.insert(instance_type.clone(), (*cached).clone());
                }
                None => missing.push(instance_type.clone()),
            }
        }

        if missing.is_empty() {
            return Ok(analyses);
        }

        let fetched = self.inner.get_batch_price_analysis(&missing, lookback_days).await?;
        for (instance_type, analysis) in fetched {
            let key = Self::cache_key(self.region(), &instance_type, lookback_days);
            self.cache.set(key, analysis.clone(), self.ttl);
            analyses.insert(instance_type, analysis);
        }
        Ok(analyses)
    }
}
