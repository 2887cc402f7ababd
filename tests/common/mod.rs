//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use site_guard::clock::ManualClock;
use site_guard::config::GuardConfig;
use site_guard::http::{build_router, AppState};
use site_guard::observability::{MemorySink, SecureLogger};

pub const START_MILLIS: u64 = 1_700_000_000_000;
pub const ADMIN_KEY: &str = "admin-test-key";
pub const COCKPIT_CODE: &str = "open-sesame";
pub const SERVICE_USER: &str = "svc";
pub const SERVICE_PASS: &str = "abcd efgh ijkl mnop";
pub const CLIENT_IP: &str = "203.0.113.9";

/// Provider base URL under a wiremock server.
pub fn provider_base(server_uri: &str) -> String {
    format!("{server_uri}/wp-json/wp/v2")
}

pub fn test_config(provider_url: Option<String>) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.provider.base_url = provider_url;
    config.provider.auth_user = Some(SERVICE_USER.to_string());
    config.provider.auth_pass = Some(SecretString::from(SERVICE_PASS.to_string()));
    config.provider.timeout_secs = 2;
    config.session.secret = Some(SecretString::from("k".repeat(32)));
    config.cockpit.access_code = Some(SecretString::from(COCKPIT_CODE.to_string()));
    config.admin.enabled = true;
    config.admin.api_key = Some(SecretString::from(ADMIN_KEY.to_string()));
    config
}

pub fn basic_auth(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

/// Router driven in-process with a manual clock and captured logs.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sink: Arc<MemorySink>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new(config: GuardConfig) -> Self {
        let sink = Arc::new(MemorySink::new());
        let logger = SecureLogger::new(true, sink.clone());
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let state = AppState::with_clock(config, logger, clock.clone()).unwrap();
        let router = build_router(state.clone());
        Self {
            router,
            state,
            sink,
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Fetch a CSRF token. Returns the token and the `name=value` cookie pair.
    pub async fn csrf(&self) -> (String, String) {
        let response = self.send(get("/api/csrf", &[])).await;
        let cookie = set_cookies(&response)
            .into_iter()
            .find(|c| c.starts_with("csrf_token="))
            .map(|c| cookie_pair(&c))
            .expect("csrf cookie");
        let body = body_json(response).await;
        (body["csrf_token"].as_str().unwrap().to_string(), cookie)
    }

    /// Log in through the HTTP surface and return the session cookie pair.
    /// The provider must already accept the credentials.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (token, csrf_cookie) = self.csrf().await;
        let response = self
            .send(form_post(
                "/api/auth/login",
                &[("username", username), ("password", password), ("csrf_token", token.as_str())],
                &[csrf_cookie],
                CLIENT_IP,
            ))
            .await;
        assert_eq!(response.status(), 200, "login should succeed");
        set_cookies(&response)
            .into_iter()
            .find(|c| c.starts_with("admin_session="))
            .map(|c| cookie_pair(&c))
            .expect("session cookie")
    }
}

fn peer(ip: &str) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 50_000))
}

pub fn get(uri: &str, cookies: &[String]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).extension(peer(CLIENT_IP));
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies.join("; "));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_post(uri: &str, fields: &[(&str, &str)], cookies: &[String], client_ip: &str) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .extension(peer(client_ip));
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies.join("; "));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Raw `Set-Cookie` header values.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// `name=value` part of a `Set-Cookie` value.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().trim().to_string()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
