//! Content reads degrade gracefully; post creation requires a session,
//! a CSRF token, and stores only sanitized content.

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json as body_json_eq, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use site_guard::error::messages;

mod common;
use common::*;

const USER: &str = "editor";
const PASS: &str = "hunter2hunter2";

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_posts_are_listed_with_page_count() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "3")
                .set_body_json(json!([
                    { "id": 1, "slug": "first", "title": { "rendered": "First" } },
                    { "id": 2, "slug": "second", "title": { "rendered": "Second" } }
                ])),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));
    let response = app.send(get("/api/posts?per_page=2", &[])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["posts"][1]["slug"], "second");
}

#[tokio::test]
async fn test_provider_failure_degrades_to_empty() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));

    let posts = app.send(get("/api/posts", &[])).await;
    assert_eq!(posts.status(), StatusCode::OK);
    assert_eq!(body_json(posts).await, json!({ "posts": [], "total_pages": 1 }));

    let categories = app.send(get("/api/categories", &[])).await;
    assert_eq!(body_json(categories).await, json!([]));

    assert!(app.sink.contains("HTTP 500"));
}

#[tokio::test]
async fn test_unconfigured_provider_degrades_to_empty() {
    let app = TestApp::new(test_config(None));
    let response = app.send(get("/api/posts", &[])).await;
    assert_eq!(body_json(response).await["posts"], json!([]));
}

#[tokio::test]
async fn test_post_by_slug() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "hello-world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "slug": "hello-world", "content": { "rendered": "<p>Hi</p>" } }
        ])))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));

    let found = app.send(get("/api/posts/hello-world", &[])).await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body_json(found).await["id"], 9);

    let missing = app.send(get("/api/posts/missing", &[])).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let invalid = app.send(get("/api/posts/Not_A_Slug", &[])).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(invalid).await["error"], "Invalid post slug");
}

#[tokio::test]
async fn test_create_post_requires_session() {
    let app = TestApp::new(test_config(None));
    let (token, cookie) = app.csrf().await;

    let response = app
        .send(form_post(
            "/api/admin/posts",
            &[("title", "Hello"), ("content", "<p>x</p>"), ("csrf_token", token.as_str())],
            &[cookie],
            CLIENT_IP,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], messages::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_post_sends_sanitized_content() {
    let provider = MockServer::start().await;
    mount_login(&provider).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header_eq("authorization", basic_auth(SERVICE_USER, SERVICE_PASS).as_str()))
        .and(body_json_eq(json!({
            "title": "Hello & welcome",
            "content": "<p>Body</p>",
            "excerpt": "Short",
            "status": "publish",
            "categories": [3]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "slug": "hello-welcome",
            "link": "https://cms.example.com/hello-welcome"
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));
    let session = app.login(USER, PASS).await;
    let (token, csrf_cookie) = app.csrf().await;

    let response = app
        .send(form_post(
            "/api/admin/posts",
            &[
                ("title", "<b>Hello</b> & welcome"),
                ("content", "<p onclick=\"steal()\">Body<script>alert(1)</script></p>"),
                ("excerpt", "<em>Short</em>"),
                ("categories", "3"),
                ("csrf_token", token.as_str()),
            ],
            &[session, csrf_cookie],
            CLIENT_IP,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], 42);
    assert_eq!(body["slug"], "hello-welcome");
    assert!(app.sink.contains("Post created"));
    assert!(app.sink.contains(r#""user":"editor""#));
}

#[tokio::test]
async fn test_create_post_rejects_markup_only_title() {
    let provider = MockServer::start().await;
    mount_login(&provider).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));
    let session = app.login(USER, PASS).await;
    let (token, csrf_cookie) = app.csrf().await;

    let response = app
        .send(form_post(
            "/api/admin/posts",
            &[
                ("title", "<script>alert(1)</script>"),
                ("content", "<p>x</p>"),
                ("csrf_token", token.as_str()),
            ],
            &[session, csrf_cookie],
            CLIENT_IP,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Title is required");
}

#[tokio::test]
async fn test_create_post_without_csrf_is_forbidden() {
    let provider = MockServer::start().await;
    mount_login(&provider).await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));
    let session = app.login(USER, PASS).await;

    let response = app
        .send(form_post(
            "/api/admin/posts",
            &[("title", "Hello"), ("content", "<p>x</p>")],
            &[session],
            CLIENT_IP,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_provider_write_failure_is_masked() {
    let provider = MockServer::start().await;
    mount_login(&provider).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("SQLSTATE[42S02]"))
        .mount(&provider)
        .await;

    let app = TestApp::new(test_config(Some(provider_base(&provider.uri()))));
    let session = app.login(USER, PASS).await;
    let (token, csrf_cookie) = app.csrf().await;

    let response = app
        .send(form_post(
            "/api/admin/posts",
            &[("title", "Hello"), ("content", "<p>x</p>"), ("csrf_token", token.as_str())],
            &[session, csrf_cookie],
            CLIENT_IP,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], messages::GENERIC_FAILURE);
    assert!(!body.to_string().contains("SQLSTATE"));
    assert!(app.sink.contains("create_post"));
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new(test_config(None));
    let response = app.send(get("/api/health", &[])).await;

    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers["content-security-policy"]
        .to_str()
        .unwrap()
        .contains("frame-ancestors 'none'"));
    assert!(headers.contains_key("x-request-id"));
}
