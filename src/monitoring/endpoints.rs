use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::error;

use crate::monitoring::{health_check_detailed, health_check_simple};
use crate::observability::update_account_gauges;
use crate::state::AppState;

/// Health, liveness and Prometheus endpoints
pub fn monitoring_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check_simple))
        .route("/health/detailed", get(health_check_detailed))
        .route("/metrics", get(prometheus_metrics))
        .route("/live", get(liveness_check))
}

/// Prometheus text exposition; account gauges are refreshed from the store first
async fn prometheus_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_account_gauges(&state.accounts.list_accounts().await);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("❌ Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
        .into_response()
}

async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, "Alive")
}
