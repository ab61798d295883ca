pub mod analytics;
pub mod chat;
pub mod health;
pub mod publications;

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics;
use crate::middleware as app_middleware;
use crate::services::AppState;

/// Maximum concurrent requests (backpressure control)
const MAX_CONCURRENT_REQUESTS: usize = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// All application routes, without the middleware stack or the metrics
/// recorder. Integration tests drive this router directly.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/publications", get(publications::list_publications))
        .route("/analytics", get(analytics::dashboard))
        .route("/chat", post(chat::post_chat).get(chat::get_chat))
        .route(
            "/chat/history",
            get(chat::get_history).delete(chat::delete_history),
        )
        .route(
            "/chat/sessions",
            get(chat::list_sessions).delete(chat::delete_session),
        )
        .route("/health", get(health::health_check))
        .route("/readiness", get(health::readiness_check))
        .with_state(state)
}

/// The production router: api routes plus metrics and the middleware
/// stack. Installs the process-global Prometheus recorder, so call it
/// once.
pub fn create_router(state: AppState) -> Router {
    let (prometheus_layer, metrics_router) = metrics::setup_metrics();

    api_router(state).merge(metrics_router).layer(
        ServiceBuilder::new()
            // Prometheus metrics (outermost - captures all requests)
            .layer(prometheus_layer)
            .layer(TraceLayer::new_for_http())
            // Request timeout
            .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            // Concurrency limit for backpressure
            .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
            // Request ID propagation
            .layer(axum::middleware::from_fn(app_middleware::request_id))
            .layer(CorsLayer::permissive()),
    )
}
