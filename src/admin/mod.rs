//! Operator API, mounted when `admin.enabled` is set.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::get,
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::admin_auth_middleware;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/rate-limits/{identifier}",
            get(get_rate_limit).delete(reset_rate_limit),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
