use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod monitoring;
pub mod observability;
pub mod security;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;

use api::create_api_router;
use monitoring::endpoints::monitoring_router;
use observability::metrics_middleware;
use security::security_headers_middleware;
use state::AppState;

use axum::middleware as axum_middleware;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&app_state.config.server.static_dir);

    Router::new()
        // /health, /metrics, /live
        .merge(monitoring_router())
        .merge(create_api_router())
        .with_state(app_state)
        // Dashboard UI (index.html, app.js, styles.css)
        .fallback_service(static_dir)
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .deflate(true)
                .compress_when(SizeAbove::new(1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
