//! HTTP API: recommendations, predictions, zones, cache, health and metrics

use advisor_lib::{
    advisor::Advisor,
    health::{ComponentStatus, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
    prediction::WeightProfile,
    rate_limit::RateLimiter,
    AdvisorError, UsageRequirements,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::middleware::rate_limit;

/// Shared application state
pub struct AppState {
    pub advisor: Arc<Advisor>,
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub limiter: Arc<RateLimiter>,
    pub logger: StructuredLogger,
    /// `top_n` applied when a request leaves it out
    pub default_top_n: usize,
}

impl AppState {
    pub fn new(
        advisor: Arc<Advisor>,
        health_registry: HealthRegistry,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            advisor,
            health_registry,
            metrics: AdvisorMetrics::new(),
            limiter,
            logger: StructuredLogger::new("spot-advisor"),
            default_top_n: 10,
        }
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// Errors returned to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    Advisor(AdvisorError),
    BadRequest(String),
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        ApiError::Advisor(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Advisor(err) if err.is_input_error() => StatusCode::BAD_REQUEST,
            ApiError::Advisor(AdvisorError::DeadlineExceeded { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Advisor(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Advisor(err) => err.to_string(),
            ApiError::BadRequest(message) => message.clone(),
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        }
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Recommendation body: usage requirements with an optional `top_n`
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(flatten)]
    pub requirements: UsageRequirements,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionQuery {
    pub region: Option<String>,
}

/// Zone query: `smart=false` selects price-only ranking. Explicit weights
/// take precedence over a named profile.
#[derive(Debug, Default, Deserialize)]
pub struct ZoneQuery {
    pub region: Option<String>,
    pub smart: Option<bool>,
    pub profile: Option<String>,
    pub price_weight: Option<f64>,
    pub capacity_weight: Option<f64>,
    pub availability_weight: Option<f64>,
    pub stability_weight: Option<f64>,
}

impl ZoneQuery {
    /// Weight profile for the smart path, `None` for price-only ranking
    pub fn weights(&self) -> Result<Option<WeightProfile>, ApiError> {
        if self.smart == Some(false) {
            return Ok(None);
        }

        let explicit = [
            self.price_weight,
            self.capacity_weight,
            self.availability_weight,
            self.stability_weight,
        ];
        if explicit.iter().any(Option::is_some) {
            let [price, capacity, availability, stability] = explicit.map(|w| w.unwrap_or(0.0));
            return Ok(Some(WeightProfile::custom(
                "custom",
                price,
                capacity,
                availability,
                stability,
            )));
        }

        match self.profile.as_deref() {
            None => Ok(Some(WeightProfile::balanced())),
            Some(name) => WeightProfile::by_name(name).map(Some).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "unknown profile '{}', expected one of: {}",
                    name,
                    WeightProfile::names().join(", ")
                ))
            }),
        }
    }
}

/// Health check response: 200 while operational, 503 when unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut requirements = request.requirements;
    requirements.top_n = request.top_n.unwrap_or(state.default_top_n);

    let report = state.advisor.recommend(requirements).await?;
    Ok(ok(report))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(instance_type): Path<String>,
    Query(query): Query<RegionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let prediction = state
        .advisor
        .predict_price(&instance_type, query.region.as_deref())
        .await?;
    Ok(ok(prediction))
}

async fn zones(
    State(state): State<Arc<AppState>>,
    Path(instance_type): Path<String>,
    Query(query): Query<ZoneQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let weights = query.weights()?;
    let recommendation = state
        .advisor
        .recommend_zones(&instance_type, query.region.as_deref(), weights.as_ref())
        .await?;
    Ok(ok(recommendation))
}

async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ok(state.advisor.cache_report())
}

async fn cache_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let removed = state.advisor.refresh_cache();
    ok(json!({ "removed": removed }))
}

async fn families(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let families = state.advisor.families().await?;
    Ok(ok(json!({
        "cloud": state.advisor.cloud(),
        "families": families,
    })))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/recommendations", post(recommend))
        .route("/predictions/:instance_type", get(predict))
        .route("/zones/:instance_type", get(zones))
        .route("/cache", get(cache_stats))
        .route("/cache/refresh", post(cache_refresh))
        .route("/families", get(families))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_query_profiles() {
        let query = ZoneQuery::default();
        assert_eq!(query.weights().unwrap().unwrap().name, "balanced");

        let query = ZoneQuery {
            smart: Some(false),
            profile: Some("low-cost".to_string()),
            ..Default::default()
        };
        assert!(query.weights().unwrap().is_none());

        let query = ZoneQuery {
            profile: Some("cheapest".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.weights(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_zone_query_explicit_weights() {
        let query = ZoneQuery {
            profile: Some("balanced".to_string()),
            price_weight: Some(1.0),
            ..Default::default()
        };
        let weights = query.weights().unwrap().unwrap();
        assert_eq!(weights.name, "custom");
        assert_eq!(weights.price, 1.0);
        assert_eq!(weights.capacity, 0.0);
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |err: AdvisorError| ApiError::from(err).status();
        assert_eq!(status(AdvisorError::NoCandidates), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AdvisorError::invalid("weights", "all zero")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AdvisorError::provider("spot_data", "down")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(AdvisorError::DeadlineExceeded {
                completed: 0,
                total: 3
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
