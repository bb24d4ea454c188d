//! HTTP request handlers for the funding ledger
//!
//! - `pages`: upload form, market selection and the HTML report
//! - `funding`: JSON access to market discovery and report building
//! - utility endpoints (health check, API info, metrics, fallback)

use crate::{
    error::{ApiError, ApiResult},
    models::ApiResponse,
    AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub mod funding;
pub mod pages;

pub use funding::{build_report, list_markets};
pub use pages::{index, upload, view};

/// Header carrying the per-request UUID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by the request-id middleware, if present
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Health check endpoint
///
/// Used for monitoring and load balancer health checks.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "funding-ledger-api"
    }))
}

/// API information endpoint
pub async fn api_info() -> Json<ApiResponse<serde_json::Value>> {
    let info = json!({
        "name": "Funding Ledger API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Per-market funding statistics and year-end forecasts from exchange CSV exports",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "pages": {
                "upload_form": "/",
                "upload": "/upload",
                "view": "/view"
            },
            "funding": {
                "markets": "/api/v1/funding/markets",
                "report": "/api/v1/funding/report"
            }
        },
        "timeframes": ["day", "week", "month", "all"],
        "documentation": "/api/v1/docs"
    });

    Json(ApiResponse::success(info))
}

/// Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> ApiResult<Response> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::not_found("/metrics"))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0.get("status").unwrap(), "healthy");
    }

    #[tokio::test]
    async fn test_api_info() {
        let response = api_info().await;
        assert!(response.0.success);
        let data = response.0.data.unwrap();
        assert_eq!(data["endpoints"]["funding"]["report"], "/api/v1/funding/report");
    }

    #[test]
    fn test_request_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), None);
        headers.insert(REQUEST_ID_HEADER, "abc-123".parse().unwrap());
        assert_eq!(request_id(&headers).as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn test_fallback_is_not_found() {
        let err = not_found(Uri::from_static("/missing")).await;
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
