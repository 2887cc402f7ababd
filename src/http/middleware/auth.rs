//! Session gate for admin routes.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::messages;
use crate::http::cookies::jar_from_headers;
use crate::http::handlers::failure_body;
use crate::http::server::AppState;

/// Reject requests without a valid session with 401. On success the
/// [`SessionClaims`](crate::session::SessionClaims) are inserted into the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = jar_from_headers(request.headers());
    match state.sessions.current_session(&jar) {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
            (StatusCode::UNAUTHORIZED, failure_body(messages::UNAUTHORIZED)).into_response()
        }
    }
}
