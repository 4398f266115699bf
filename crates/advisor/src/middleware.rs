//! Rate-limit middleware for the `/api` routes

use advisor_lib::rate_limit::resolve_client_id;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::AppState;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Identity a request is throttled under
pub fn client_id(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let header_str = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    let remote = remote.map(|addr| addr.to_string());
    resolve_client_id(
        header_str("x-forwarded-for"),
        header_str("x-real-ip"),
        remote.as_deref(),
    )
}

/// Admit the request or answer 429 with `Retry-After`
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_id(request.headers(), remote);

    if state.limiter.allow(&client) {
        return next.run(request).await;
    }

    state.metrics.inc_rate_limited();
    state.logger.log_rate_limited(&client, request.uri().path());

    let retry_after = state.limiter.retry_after_secs().to_string();
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "success": false, "error": RATE_LIMIT_MESSAGE })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_precedence() {
        let remote: SocketAddr = "10.0.0.9:51234".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_id(&headers, Some(remote)), "10.0.0.9");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        assert_eq!(client_id(&headers, Some(remote)), "192.0.2.7");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.5, 70.41.3.18"),
        );
        assert_eq!(client_id(&headers, Some(remote)), "203.0.113.5");
    }

    #[test]
    fn test_ipv6_remote_strips_port() {
        let remote: SocketAddr = "[2001:db8::1]:8080".parse().unwrap();
        assert_eq!(client_id(&HeaderMap::new(), Some(remote)), "2001:db8::1");
    }
}
