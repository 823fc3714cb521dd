// ============================================================================
// PROMETHEUS METRICS - dashboard observability
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use shared::{AccountState, AccountStatus};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total HTTP requests by method, endpoint and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========================================================================
    // GAME API METRICS
    // ========================================================================

    /// Calls to the external game server by route and outcome
    pub static ref GAME_API_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "game_api_calls_total",
        "Total number of calls to the game server",
        &["route", "status"]
    )
    .unwrap();

    pub static ref GAME_API_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "game_api_duration_seconds",
        "Game server call duration in seconds",
        &["route"],
        vec![0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========================================================================
    // ACCOUNT METRICS
    // ========================================================================

    /// Reconcile results per outcome (cooldown, prize_claimed, error, ...)
    pub static ref ACCOUNT_RECONCILES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "account_reconciles_total",
        "Total number of account reconciliations by resulting status",
        &["status"]
    )
    .unwrap();

    pub static ref ACCOUNTS_BY_STATUS: IntGaugeVec = register_int_gauge_vec!(
        "accounts_by_status",
        "Number of accounts currently in each status",
        &["status"]
    )
    .unwrap();
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

pub fn record_game_api_call(route: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };

    GAME_API_CALLS_TOTAL
        .with_label_values(&[route, status])
        .inc();

    GAME_API_DURATION_SECONDS
        .with_label_values(&[route])
        .observe(duration_secs);
}

pub fn record_reconcile(status: AccountStatus) {
    ACCOUNT_RECONCILES_TOTAL
        .with_label_values(&[status.as_str()])
        .inc();
}

/// Refresh the per-status gauges from a full account listing
pub fn update_account_gauges(accounts: &[AccountState]) {
    for status in AccountStatus::ALL {
        let count = accounts.iter().filter(|a| a.status == status).count();
        ACCOUNTS_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(count as i64);
    }
}
