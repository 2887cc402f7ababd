//! Security response headers and HTTPS enforcement.
//!
//! # Responsibilities
//! - Build the Content-Security-Policy for the site
//! - Attach hardening headers to every page and API response
//! - Redirect plain HTTP to HTTPS behind a TLS-terminating proxy
//!
//! # Design Decisions
//! - Static assets only get `X-Content-Type-Options`
//! - The CSP is computed once at startup
//! - `X-Forwarded-Proto` is only consulted in production

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::GuardConfig;

const GRAVATAR_ORIGIN: &str = "https://secure.gravatar.com";

const STATIC_PREFIXES: &[&str] = &["/_next/static/", "/_next/image", "/static/", "/assets/"];
const STATIC_FILES: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];

/// Content-Security-Policy value.
///
/// `provider_origin` is allowed as an image source and a fetch target.
/// `unsafe-eval` is only added in development.
pub fn build_csp(provider_origin: Option<&str>, development: bool) -> String {
    let script_src = if development {
        "script-src 'self' 'unsafe-inline' 'unsafe-eval'"
    } else {
        "script-src 'self' 'unsafe-inline'"
    };

    let mut img_src = String::from("img-src 'self' data: blob:");
    if let Some(origin) = provider_origin {
        img_src.push(' ');
        img_src.push_str(origin);
    }
    img_src.push(' ');
    img_src.push_str(GRAVATAR_ORIGIN);

    let mut connect_src = String::from("connect-src 'self'");
    if let Some(origin) = provider_origin {
        connect_src.push(' ');
        connect_src.push_str(origin);
    }

    [
        "default-src 'self'",
        script_src,
        "style-src 'self' 'unsafe-inline'",
        img_src.as_str(),
        "font-src 'self' data:",
        connect_src.as_str(),
        "frame-ancestors 'none'",
        "base-uri 'self'",
        "form-action 'self'",
        "object-src 'none'",
    ]
    .join("; ")
}

/// True for paths served as static assets.
pub fn is_static_asset(path: &str) -> bool {
    STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || STATIC_FILES.contains(&path)
}

/// Precomputed header set shared by the middleware.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    page: HeaderMap,
}

impl SecurityHeaders {
    pub fn new(config: &GuardConfig) -> Self {
        let csp = build_csp(config.provider.origin().as_deref(), !config.is_production());

        let mut page = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&csp) {
            page.insert(header::CONTENT_SECURITY_POLICY, value);
        }
        page.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        page.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        page.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        page.insert(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        );
        page.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

        Self { page }
    }

    /// Apply the headers appropriate for `path`. Existing values win.
    pub fn apply(&self, path: &str, headers: &mut HeaderMap) {
        if is_static_asset(path) {
            headers
                .entry(header::X_CONTENT_TYPE_OPTIONS)
                .or_insert(HeaderValue::from_static("nosniff"));
            return;
        }
        for (name, value) in &self.page {
            headers.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Middleware that attaches security headers to every response.
pub async fn security_headers(
    State(policy): State<Arc<SecurityHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    policy.apply(&path, response.headers_mut());
    response
}

/// Middleware that sends a 301 to the HTTPS URL when the fronting proxy
/// reports the original request was plain HTTP.
pub async fn https_redirect(request: Request<Body>, next: Next) -> Response {
    match https_location(&request) {
        Some(location) => {
            tracing::debug!(location = ?location, "Redirecting to HTTPS");
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        None => next.run(request).await,
    }
}

fn https_location(request: &Request<Body>) -> Option<HeaderValue> {
    let headers = request.headers();
    let proto = headers.get("x-forwarded-proto")?.to_str().ok()?;
    if !proto.trim().eq_ignore_ascii_case("http") {
        return None;
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    HeaderValue::from_str(&format!("https://{host}{path}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_csp_production() {
        let csp = build_csp(Some("https://cms.example.com"), false);
        assert!(csp.starts_with("default-src 'self'; "));
        assert!(csp.contains("img-src 'self' data: blob: https://cms.example.com https://secure.gravatar.com"));
        assert!(csp.contains("connect-src 'self' https://cms.example.com;"));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(csp.contains("object-src 'none'"));
        assert!(!csp.contains("unsafe-eval"));
    }

    #[test]
    fn test_csp_development_allows_eval() {
        let csp = build_csp(None, true);
        assert!(csp.contains("'unsafe-eval'"));
        assert!(csp.contains("img-src 'self' data: blob: https://secure.gravatar.com"));
        assert!(csp.contains("connect-src 'self';"));
    }

    #[test]
    fn test_static_asset_detection() {
        assert!(is_static_asset("/_next/static/chunks/app.js"));
        assert!(is_static_asset("/favicon.ico"));
        assert!(!is_static_asset("/api/posts"));
        assert!(!is_static_asset("/"));
    }

    #[test]
    fn test_static_assets_only_get_nosniff() {
        let policy = SecurityHeaders::new(&GuardConfig::default());

        let mut headers = HeaderMap::new();
        policy.apply("/assets/logo.svg", &mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let mut headers = HeaderMap::new();
        policy.apply("/blog/hello", &mut headers);
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key("permissions-policy"));
    }

    fn redirect_app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/blog", get(|| async { "ok" }))
            .layer(middleware::from_fn(https_redirect))
    }

    #[tokio::test]
    async fn test_http_is_redirected() {
        let response = redirect_app()
            .oneshot(
                Request::builder()
                    .uri("/blog?page=2")
                    .header("host", "example.com")
                    .header("x-forwarded-proto", "http")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/blog?page=2");
    }

    #[tokio::test]
    async fn test_redirect_without_host_passes_through() {
        let response = redirect_app()
            .oneshot(
                Request::builder()
                    .uri("/blog")
                    .header("x-forwarded-proto", "http")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_https_passes_through() {
        let response = redirect_app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("host", "example.com")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
