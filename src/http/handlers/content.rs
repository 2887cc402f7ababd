//! Public content reads and authenticated post creation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{log_error, messages, AppError, AppResult};
use crate::http::cookies::Cookies;
use crate::http::handlers::failure_body;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::provider::{Category, NewPost, PostPage, PostQuery};
use crate::security::sanitize::{sanitize_html, sanitize_text};
use crate::session::SessionClaims;

/// `GET /api/posts`
pub async fn list_posts(State(state): State<AppState>, Query(query): Query<PostQuery>) -> Json<PostPage> {
    Json(state.content.get_posts(&query).await)
}

/// `GET /api/posts/{slug}`
pub async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.content.get_post_by_slug(&slug).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, failure_body("Post not found")).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.content.get_categories().await)
}

#[derive(Debug, Deserialize)]
pub struct NewPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    /// Comma-separated category ids.
    #[serde(default)]
    pub categories: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl NewPostForm {
    /// Sanitize every field and build the provider payload.
    pub fn into_post(self) -> AppResult<NewPost> {
        let title = sanitize_text(&self.title);
        if title.is_empty() {
            return Err(AppError::trusted("Title is required"));
        }

        let content = sanitize_html(&self.content);
        let excerpt = Some(sanitize_text(&self.excerpt)).filter(|e| !e.is_empty());
        let categories = parse_categories(&self.categories)?;

        Ok(NewPost::published(title, content, excerpt, categories))
    }
}

fn parse_categories(raw: &str) -> AppResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse().map_err(|_| AppError::trusted("Invalid category id")))
        .collect()
}

/// `POST /api/admin/posts`. Runs behind `require_auth`.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Cookies(jar): Cookies,
    Form(form): Form<NewPostForm>,
) -> Response {
    if !state.csrf.verify_token(&jar, form.csrf_token.as_deref()) {
        metrics::record_csrf_rejection();
        return (StatusCode::FORBIDDEN, failure_body(messages::INVALID_FORM)).into_response();
    }

    let post = match form.into_post() {
        Ok(post) => post,
        Err(err) => return err.into_response(),
    };

    match state.content.create_post(&post).await {
        Ok(created) => {
            state.logger.info(
                "Post created",
                Some(&json!({ "id": created.id, "slug": created.slug, "user": claims.sub })),
            );
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "id": created.id, "slug": created.slug })),
            )
                .into_response()
        }
        Err(err) => {
            log_error(
                &state.logger,
                &err,
                Some(json!({ "action": "create_post", "user": claims.sub })),
            );
            err.into_response()
        }
    }
}
