//! Posts and categories.
//!
//! Read calls never fail the page: on any upstream problem they log the
//! error and return an empty result. Writes use the server-only
//! application password and return the error to the caller.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::{log_error, AppError, AppResult};
use crate::observability::SecureLogger;
use crate::provider::types::{Category, CreatedPost, NewPost, Post, PostPage, PostQuery};
use crate::provider::{endpoint_url, send_tracked};

const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    base_url: Option<String>,
    auth_user: Option<String>,
    auth_pass: Option<SecretString>,
    logger: SecureLogger,
}

/// Lowercase letters, digits and hyphens only.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl ContentClient {
    pub fn new(http: Client, config: &ProviderConfig, logger: SecureLogger) -> Self {
        Self {
            http,
            base_url: config.base_url().map(str::to_string),
            auth_user: config.auth_user.clone(),
            auth_pass: config.auth_pass.clone(),
            logger,
        }
    }

    pub async fn get_posts(&self, query: &PostQuery) -> PostPage {
        match self.fetch_posts(query).await {
            Ok(page) => page,
            Err(err) => {
                log_error(&self.logger, &err, Some(json!({ "operation": "get_posts" })));
                PostPage::default()
            }
        }
    }

    async fn fetch_posts(&self, query: &PostQuery) -> AppResult<PostPage> {
        let url = endpoint_url(self.base_url.as_deref(), "posts")?;
        let response = send_tracked("posts", self.http.get(url).query(&query.to_pairs())).await?;

        let total_pages = response
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        let posts: Vec<Post> = response.json().await?;

        Ok(PostPage { posts, total_pages })
    }

    /// Look a post up by slug.
    ///
    /// A malformed slug is a trusted error. Upstream failures are logged
    /// and reported as not found.
    pub async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<Post>> {
        if !is_valid_slug(slug) {
            return Err(AppError::trusted("Invalid post slug"));
        }

        let result = async {
            let url = endpoint_url(self.base_url.as_deref(), "posts")?;
            let response = send_tracked("posts", self.http.get(url).query(&[("slug", slug)])).await?;
            let posts: Vec<Post> = response.json().await?;
            Ok::<_, AppError>(posts.into_iter().next())
        }
        .await;

        match result {
            Ok(post) => Ok(post),
            Err(err) => {
                log_error(
                    &self.logger,
                    &err,
                    Some(json!({ "operation": "get_post_by_slug", "slug": slug })),
                );
                Ok(None)
            }
        }
    }

    pub async fn get_categories(&self) -> Vec<Category> {
        let result = async {
            let url = endpoint_url(self.base_url.as_deref(), "categories")?;
            let request = self.http.get(url).query(&[("per_page", "100")]);
            let response = send_tracked("categories", request).await?;
            Ok::<_, AppError>(response.json::<Vec<Category>>().await?)
        }
        .await;

        result.unwrap_or_else(|err| {
            log_error(&self.logger, &err, Some(json!({ "operation": "get_categories" })));
            Vec::new()
        })
    }

    /// Publish a post with the server credentials.
    pub async fn create_post(&self, post: &NewPost) -> AppResult<CreatedPost> {
        let (Some(user), Some(pass)) = (self.auth_user.as_deref(), self.auth_pass.as_ref()) else {
            return Err(AppError::system("Provider write credentials are not configured"));
        };
        let url = endpoint_url(self.base_url.as_deref(), "posts")?;

        let request = self
            .http
            .post(url)
            .basic_auth(user, Some(pass.expose_secret()))
            .json(post);
        let response = send_tracked("posts", request)
            .await
            .map_err(|err| err.with_context(json!({ "operation": "create_post" })))?;

        Ok(response.json().await?)
    }
}
