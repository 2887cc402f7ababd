use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::security::rate_limit::RateLimitResult;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub environment: &'static str,
    pub rate_limit_entries: usize,
    pub sweeper_running: bool,
    pub cockpit_configured: bool,
}

#[derive(Serialize)]
pub struct RateLimitStatus {
    pub identifier: String,
    #[serde(flatten)]
    pub status: RateLimitResult,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        environment: if state.config.is_production() {
            "production"
        } else {
            "development"
        },
        rate_limit_entries: state.limiter.len(),
        sweeper_running: state.limiter.is_running(),
        cockpit_configured: state.cockpit.is_configured(),
    })
}

/// Current window for an identifier such as `login:203.0.113.9`.
/// `cockpit:` identifiers are reported against the cockpit limit.
pub async fn get_rate_limit(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Json<RateLimitStatus> {
    let limit = if identifier.starts_with("cockpit:") {
        state.config.cockpit.limit
    } else {
        state.config.rate_limit.limit
    };
    let status = state.limiter.peek_status(&identifier, limit);
    Json(RateLimitStatus { identifier, status })
}

pub async fn reset_rate_limit(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> StatusCode {
    state.limiter.reset(&identifier);
    tracing::info!(identifier = %identifier, "Rate limit reset by admin");
    StatusCode::NO_CONTENT
}
