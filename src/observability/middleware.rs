// ============================================================================
// MIDDLEWARE FOR AUTOMATIC REQUEST METRICS
// ============================================================================

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::record_http_request;

/// Records count and latency of every HTTP request
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let normalized_path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &normalized_path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Collapses per-account segments so label cardinality stays bounded
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let is_account_scoped = |i: usize| {
        i >= 2
            && matches!(
                (segments[i - 2], segments[i - 1]),
                ("api", "hub") | ("api", "wallet") | ("game", "start")
            )
    };

    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            if !seg.is_empty() && is_account_scoped(i) {
                ":phone".to_string()
            } else if seg.contains('.') {
                ":asset".to_string()
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_account_paths() {
        assert_eq!(normalize_path("/api/hub/5551234567"), "/api/hub/:phone");
        assert_eq!(normalize_path("/api/wallet/%2B15551234567"), "/api/wallet/:phone");
        assert_eq!(normalize_path("/api/game/start/5551234567"), "/api/game/start/:phone");
        assert_eq!(normalize_path("/api/game/end"), "/api/game/end");
        assert_eq!(normalize_path("/api/state"), "/api/state");
        assert_eq!(normalize_path("/app.js"), "/:asset");
    }
}
