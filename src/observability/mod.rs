//! Prometheus metrics for HTTP traffic, game server calls and account outcomes

pub mod metrics;
pub mod middleware;

pub use metrics::*;
pub use middleware::*;
