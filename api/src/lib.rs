//! # Funding Ledger API
//!
//! HTTP surface for the funding ledger, built with Axum.
//!
//! ## Features
//! - Upload form, market selection page and HTML analytics report
//! - JSON endpoints for market discovery and report building
//! - Request ids, tracing, CORS, body limits and request timeouts
//! - Prometheus metrics exposition
//!
//! ## Architecture
//! - `handlers`: HTTP request handlers
//! - `render`: HTML pages
//! - `models`: API request/response models
//! - `config`: Server configuration
//! - `error`: Error types and handling

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod render;

pub use config::{ApiConfig, LoggingConfig};
pub use error::{ApiError, ApiResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ApiConfig>,
    /// Prometheus handle, present when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates state from a loaded configuration
    pub fn new(config: ApiConfig, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            config: Arc::new(config),
            metrics,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(parsed))
}

/// Builds the router with every route and middleware layer
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = handlers::request_id(request.headers());
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id.as_deref().unwrap_or("-"),
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer(&config.cors_origins));

    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/view", post(handlers::view))
        // JSON endpoints
        .route("/api/v1/funding/markets", post(handlers::list_markets))
        .route("/api/v1/funding/report", post(handlers::build_report))
        // Utility
        .route("/health", get(handlers::health_check))
        .route("/api/v1/docs", get(handlers::api_info))
        .route("/metrics", get(handlers::metrics_handler))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware)
        .with_state(state)
}

/// Main API server structure
pub struct ApiServer {
    /// Axum router with all routes configured
    router: Router,
    /// Server configuration
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with all routes and middleware configured
    pub fn new(config: ApiConfig, metrics: Option<PrometheusHandle>) -> Self {
        let metrics = metrics.filter(|_| config.enable_metrics);
        let state = AppState::new(config, metrics);
        let config = state.config.clone();

        info!(
            environment = %config.environment,
            metrics = state.metrics.is_some(),
            "API server configured"
        );

        Self {
            router: router(state),
            config,
        }
    }

    /// Serves requests until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("Funding ledger listening on http://{}", addr);
        info!("Health check available at http://{}/health", addr);
        info!("API documentation available at http://{}/api/v1/docs", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("Funding ledger server stopped");
        Ok(())
    }

    /// Returns server configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns a clone of the configured router
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(ApiConfig::default(), None))
    }

    #[tokio::test]
    async fn health_route_responds() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let response = app()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn server_keeps_config() {
        let mut config = ApiConfig::default();
        config.enable_metrics = false;
        let server = ApiServer::new(config, None);
        assert!(!server.config().enable_metrics);
    }
}
