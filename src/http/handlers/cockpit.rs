//! Cockpit access code check.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::messages;
use crate::http::cookies::Cookies;
use crate::http::handlers::failure_body;
use crate::http::request::ClientId;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Deserialize)]
pub struct UnlockForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// `POST /api/cockpit/unlock`
pub async fn unlock(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Cookies(jar): Cookies,
    Form(form): Form<UnlockForm>,
) -> Response {
    if state.config.rate_limit.enabled {
        let now = state.limiter.now_millis();
        let cockpit = &state.config.cockpit;
        let result = state
            .limiter
            .check_with(&format!("cockpit:{client}"), cockpit.limit, cockpit.window_ms);
        if !result.success {
            metrics::record_rate_limited("cockpit");
            return result.into_rejection(now);
        }
    }

    if !state.csrf.verify_token(&jar, form.csrf_token.as_deref()) {
        metrics::record_csrf_rejection();
        return (StatusCode::FORBIDDEN, failure_body(messages::INVALID_FORM)).into_response();
    }

    if state.cockpit.verify(&form.code) {
        state
            .logger
            .info("Cockpit unlocked", Some(&json!({ "client": client })));
        return Json(json!({ "success": true })).into_response();
    }

    state.logger.warn(
        "Cockpit access code rejected",
        Some(&json!({ "client": client, "configured": state.cockpit.is_configured() })),
    );
    (StatusCode::UNAUTHORIZED, failure_body(messages::ACCESS_DENIED)).into_response()
}
