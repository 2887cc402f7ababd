//! CSRF token issuance, login, logout and session status.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::messages;
use crate::http::cookies::Cookies;
use crate::http::handlers::failure_body;
use crate::http::request::ClientId;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::csrf::TOKEN_BYTES;
use crate::session::LoginOutcome;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// `GET /api/csrf`: reuse the cookie token when it is well formed,
/// otherwise issue a new one.
pub async fn csrf_token(State(state): State<AppState>, Cookies(mut jar): Cookies) -> (Cookies, Json<Value>) {
    let token = state
        .csrf
        .peek_token(&jar)
        .filter(|t| t.len() == TOKEN_BYTES * 2 && t.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or_else(|| state.csrf.generate_token(&mut jar));

    (Cookies(jar), Json(json!({ "csrf_token": token })))
}

/// `POST /api/auth/login`
///
/// Order: rate limit, CSRF, credential format, provider check. A rejected
/// attempt never reaches the provider.
pub async fn login(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Cookies(mut jar): Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut limit_headers = HeaderMap::new();
    if state.config.rate_limit.enabled {
        let now = state.limiter.now_millis();
        let result = state.limiter.check(&format!("login:{client}"));
        if !result.success {
            metrics::record_rate_limited("login");
            state
                .logger
                .warn("Login rate limit exceeded", Some(&json!({ "client": client })));
            return result.into_rejection(now);
        }
        limit_headers = result.headers(now);
    }

    if !state.csrf.verify_token(&jar, form.csrf_token.as_deref()) {
        metrics::record_csrf_rejection();
        state.logger.warn(
            "CSRF verification failed",
            Some(&json!({ "action": "login", "client": client })),
        );
        return (StatusCode::FORBIDDEN, limit_headers, failure_body(messages::INVALID_FORM))
            .into_response();
    }

    let result = state.sessions.login(&mut jar, &form.username, &form.password).await;
    let status = match result.outcome {
        LoginOutcome::Authenticated => StatusCode::OK,
        LoginOutcome::Invalid => StatusCode::BAD_REQUEST,
        LoginOutcome::Denied => StatusCode::UNAUTHORIZED,
        LoginOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, limit_headers, Cookies(jar), Json(result)).into_response()
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, Cookies(mut jar): Cookies) -> (Cookies, Json<Value>) {
    state.sessions.logout(&mut jar);
    (Cookies(jar), Json(json!({ "success": true })))
}

/// `GET /api/auth/session`
pub async fn session_status(State(state): State<AppState>, Cookies(jar): Cookies) -> Json<Value> {
    Json(json!({ "authenticated": state.sessions.is_authenticated(&jar) }))
}
