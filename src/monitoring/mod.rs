pub mod endpoints;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub accounts: usize,
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageHealth {
    pub config: FileStatus,
    pub state: FileStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    pub status: String,
    pub error: Option<String>,
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

pub fn init_monitoring() {
    START_TIME.set(SystemTime::now()).ok();
    info!("🔍 Monitoring system initialized");
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn uptime_secs() -> u64 {
    START_TIME
        .get()
        .and_then(|start| SystemTime::now().duration_since(*start).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check including the JSON store files
pub async fn health_check_detailed(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let config = check_store_file(state.store.config_path()).await;
    let account_state = check_store_file(state.store.state_path()).await;
    let accounts = state.store.read_config().await.len();

    let healthy = config.status != "unhealthy" && account_state.status != "unhealthy";
    let overall_status = if healthy { "healthy" } else { "degraded" };

    let response = HealthResponse {
        status: overall_status.to_string(),
        timestamp: now_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime_secs(),
        accounts,
        storage: StorageHealth {
            config,
            state: account_state,
        },
    };

    info!("🔍 Health check completed - Status: {}", overall_status);
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}

/// A missing file is fine (it is created on first write); an unparsable one is not.
async fn check_store_file(path: &Path) -> FileStatus {
    let shown = path.display().to_string();
    match tokio::fs::read_to_string(path).await {
        Ok(data) => match serde_json::from_str::<serde_json::Value>(&data) {
            Ok(_) => FileStatus {
                path: shown,
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => {
                warn!("❌ {} is not valid JSON: {}", path.display(), e);
                FileStatus {
                    path: shown,
                    status: "unhealthy".to_string(),
                    error: Some(e.to_string()),
                }
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileStatus {
            path: shown,
            status: "missing".to_string(),
            error: None,
        },
        Err(e) => FileStatus {
            path: shown,
            status: "unhealthy".to_string(),
            error: Some(e.to_string()),
        },
    }
}

/// Simple health check for load balancers
pub async fn health_check_simple() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "prizepilot",
        "timestamp": now_secs(),
        "uptime_seconds": uptime_secs()
    }))
}
