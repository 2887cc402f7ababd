//! Admin API authentication and rate-limit management.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};

mod common;
use common::*;

fn admin_request(method: &str, uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_requires_bearer_key() {
    let app = TestApp::new(test_config(None));

    let missing = app.send(admin_request("GET", "/admin/status", None)).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .send(admin_request("GET", "/admin/status", Some("admin-test-kez")))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app.send(admin_request("GET", "/admin/status", Some(ADMIN_KEY))).await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert_eq!(body["status"], "operational");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["cockpit_configured"], true);
}

#[tokio::test]
async fn test_peek_and_reset_rate_limit() {
    let app = TestApp::new(test_config(None));
    let identifier = format!("login:{CLIENT_IP}");
    for _ in 0..3 {
        app.state.limiter.check(&identifier);
    }

    let uri = format!("/admin/rate-limits/{identifier}");
    let peek = app.send(admin_request("GET", &uri, Some(ADMIN_KEY))).await;
    assert_eq!(peek.status(), StatusCode::OK);
    let body = body_json(peek).await;
    assert_eq!(body["identifier"], identifier);
    assert_eq!(body["remaining"], 2);
    assert_eq!(body["success"], true);
    assert_eq!(body["resetAt"], START_MILLIS + 60_000);

    let reset = app.send(admin_request("DELETE", &uri, Some(ADMIN_KEY))).await;
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.state.limiter.peek_status(&identifier, 5).remaining, 5);
    assert!(app.state.limiter.is_empty());
}

#[tokio::test]
async fn test_cockpit_identifier_uses_cockpit_limit() {
    let mut config = test_config(None);
    config.cockpit.limit = 3;
    config.cockpit.window_ms = 30_000;
    let app = TestApp::new(config);
    let identifier = format!("cockpit:{CLIENT_IP}");
    app.state.limiter.check_with(&identifier, 3, 30_000);

    let uri = format!("/admin/rate-limits/{identifier}");
    let body = body_json(app.send(admin_request("GET", &uri, Some(ADMIN_KEY))).await).await;
    assert_eq!(body["limit"], 3);
    assert_eq!(body["remaining"], 2);
    assert_eq!(body["resetAt"], START_MILLIS + 30_000);
}

#[tokio::test]
async fn test_peek_does_not_consume_attempts() {
    let app = TestApp::new(test_config(None));
    let uri = format!("/admin/rate-limits/login:{CLIENT_IP}");
    for _ in 0..10 {
        app.send(admin_request("GET", &uri, Some(ADMIN_KEY))).await;
    }
    assert!(app.state.limiter.is_empty());
}

#[tokio::test]
async fn test_disabled_admin_api_is_not_mounted() {
    let mut config = test_config(None);
    config.admin.enabled = false;
    let app = TestApp::new(config);

    let response = app.send(admin_request("GET", "/admin/status", Some(ADMIN_KEY))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
