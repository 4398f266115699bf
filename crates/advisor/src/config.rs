//! Service configuration
//!
//! Read from an optional `spot-advisor.{toml,yaml,json}` file, then from
//! `ADVISOR_*` environment variables (`ADVISOR_API_PORT=9000`).

use advisor_lib::{
    advisor::AdvisorOptions, cache::CacheConfig, rate_limit::RateLimitConfig,
    scoring::ScoringConfig, CloudProvider,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base name of the optional config file in the working directory
pub const CONFIG_FILE: &str = "spot-advisor";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// HTTP port for the API, health and metrics
    pub api_port: u16,

    /// Region the live data adapters are bound to
    pub region: String,

    pub cloud: CloudProvider,

    pub cache_ttl_secs: u64,
    pub cache_cleanup_secs: u64,

    /// Price history window in days
    pub lookback_days: u32,

    /// Deadline for a whole recommendation request
    pub request_timeout_secs: u64,

    /// Bound on each provider call
    pub provider_timeout_secs: u64,

    /// Bound on a single scoring strategy call, in milliseconds
    pub strategy_timeout_ms: u64,

    pub max_workers: usize,

    /// Results returned when a request does not set `top_n`
    pub default_top_n: usize,

    pub rate_limit_requests: u32,
    pub rate_limit_interval_secs: u64,

    /// Zones returned per zone recommendation
    pub az_recommendations: usize,

    /// JSON instance catalog; the built-in sample is used when unset
    pub catalog_path: Option<PathBuf>,

    /// Recorded price history and zone listings
    pub price_history_path: Option<PathBuf>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_port: 8000,
            region: "us-east-1".to_string(),
            cloud: CloudProvider::Aws,
            cache_ttl_secs: 7200,
            cache_cleanup_secs: 600,
            lookback_days: 7,
            request_timeout_secs: 60,
            provider_timeout_secs: 5,
            strategy_timeout_ms: 2000,
            max_workers: 10,
            default_top_n: 10,
            rate_limit_requests: 100,
            rate_limit_interval_secs: 60,
            az_recommendations: 2,
            catalog_path: None,
            price_history_path: None,
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from the optional file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load with an explicit config file base path (extension optional)
    pub fn load_from(file: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&file.to_string_lossy()).required(false))
            .add_source(config::Environment::with_prefix("ADVISOR").try_parsing(true))
            .build()
            .context("Failed to read advisor configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid advisor configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            anyhow::bail!("region must not be empty");
        }
        if self.max_workers == 0 {
            anyhow::bail!("max_workers must be at least 1");
        }
        if self.rate_limit_requests == 0 || self.rate_limit_interval_secs == 0 {
            anyhow::bail!("rate limit requests and interval must be positive");
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_secs(self.cache_ttl_secs),
            cleanup_interval: Duration::from_secs(self.cache_cleanup_secs.max(1)),
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests: self.rate_limit_requests,
            interval: Duration::from_secs(self.rate_limit_interval_secs),
        }
    }

    pub fn advisor_options(&self) -> AdvisorOptions {
        AdvisorOptions {
            lookback_days: self.lookback_days,
            call_timeout: Duration::from_secs(self.provider_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            scoring: ScoringConfig {
                max_workers: self.max_workers,
                strategy_timeout: Duration::from_millis(self.strategy_timeout_ms),
            },
            az_recommendations: self.az_recommendations,
        }
    }
}
