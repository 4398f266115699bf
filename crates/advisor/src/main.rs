//! Spot Advisor - spot instance recommendation service
//!
//! Serves instance rankings, price forecasts and availability zone
//! recommendations over HTTP.

use advisor_lib::{
    advisor::Advisor,
    cache::CacheManager,
    catalog::{RecordedPriceHistory, StaticCatalog},
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    rate_limit::RateLimiter,
};
use anyhow::{Context, Result};
use spot_advisor::{api, AdvisorConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting spot-advisor");

    let config = AdvisorConfig::load()?;
    info!(
        region = %config.region,
        cloud = %config.cloud,
        port = config.api_port,
        "Advisor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CACHE).await;

    let cache = Arc::new(CacheManager::new(config.cache_config()));
    let cache_cleanup = cache.spawn_cleanup();

    let catalog = match &config.catalog_path {
        Some(path) => StaticCatalog::load(path)
            .await
            .context("Failed to load instance catalog")?,
        None => {
            info!("No catalog configured, using the built-in sample catalog");
            StaticCatalog::builtin()
        }
    };
    if catalog.cloud() != config.cloud {
        warn!(
            catalog_cloud = %catalog.cloud(),
            configured_cloud = %config.cloud,
            "Catalog cloud differs from the configured cloud"
        );
    }
    if catalog.is_empty() {
        health_registry
            .set_unhealthy(components::CATALOG, "Instance catalog is empty")
            .await;
    } else {
        health_registry.register(components::CATALOG).await;
    }
    let catalog_size = catalog.len();
    let catalog = Arc::new(catalog);

    let mut advisor = Advisor::new(config.cloud, &config.region, catalog.clone(), cache.clone())
        .with_specs_provider(catalog)
        .with_options(config.advisor_options());

    if let Some(path) = &config.price_history_path {
        match RecordedPriceHistory::load(path).await {
            Ok(history) => {
                let history = Arc::new(history);
                advisor = advisor
                    .with_price_history(history.clone())
                    .with_zone_provider(history);
            }
            Err(e) => warn!(error = %e, "Price history unavailable, continuing with heuristics"),
        }
    }

    if advisor.has_price_history() {
        health_registry.set_healthy(components::PRICE_HISTORY).await;
    } else {
        health_registry
            .set_degraded(components::PRICE_HISTORY, "No price history, using heuristics")
            .await;
    }
    if advisor.has_zone_data() {
        health_registry.set_healthy(components::ZONE_DATA).await;
    } else {
        health_registry
            .set_degraded(components::ZONE_DATA, "No zone data, using default zones")
            .await;
    }

    let limiter = Arc::new(RateLimiter::new(config.rate_limit_config()));
    let limiter_cleanup = limiter.spawn_cleanup();

    let logger = StructuredLogger::new("spot-advisor");
    logger.log_startup(
        ADVISOR_VERSION,
        config.cloud.as_str(),
        &config.region,
        catalog_size,
    );

    let app_state = Arc::new(
        api::AppState::new(Arc::new(advisor), health_registry.clone(), limiter)
            .with_default_top_n(config.default_top_n),
    );

    health_registry.set_ready(true).await;

    let mut api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = &mut api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("API server failed");
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("API server task panicked");
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
            api_handle.abort();
        }
    }

    cache_cleanup.abort();
    limiter_cleanup.abort();
    info!("Shutting down");

    Ok(())
}
