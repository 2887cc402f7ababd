//! Upstream WordPress REST API.
//!
//! # Data Flow
//! ```text
//! session::controller → identity.rs (GET users/me with the caller's credentials)
//! http handlers       → content.rs  (posts, categories; server credentials for writes)
//! ```
//!
//! # Design Decisions
//! - One shared `reqwest::Client` with a bounded timeout
//! - Non-2xx answers become system errors carrying the status as context
//! - Reads degrade to empty results; writes surface the error

pub mod content;
pub mod identity;
pub mod types;

pub use content::ContentClient;
pub use identity::IdentityClient;
pub use types::{Category, CreatedPost, NewPost, Post, PostPage, PostQuery, Rendered};

use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::json;
use std::time::{Duration, Instant};

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::observability::metrics;

const USER_AGENT: &str = concat!("site-guard/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client for provider calls.
pub fn build_http_client(config: &ProviderConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::system("Failed to build provider HTTP client").with_source(e))
}

/// `{base}/{path}` or a system error when no base URL is configured.
fn endpoint_url(base_url: Option<&str>, path: &str) -> AppResult<String> {
    match base_url {
        Some(base) => Ok(format!("{base}/{path}")),
        None => Err(AppError::system("Provider base URL is not configured")),
    }
}

/// Send a request, record metrics and turn non-2xx statuses into errors.
async fn send_tracked(endpoint: &'static str, request: RequestBuilder) -> AppResult<Response> {
    let start = Instant::now();
    let response = match request.header(header::ACCEPT, "application/json").send().await {
        Ok(response) => response,
        Err(err) => {
            metrics::record_provider_request(endpoint, 0, start);
            return Err(AppError::from(err).with_context(json!({ "endpoint": endpoint })));
        }
    };

    let status = response.status();
    metrics::record_provider_request(endpoint, status.as_u16(), start);
    if !status.is_success() {
        return Err(
            AppError::system(format!("Provider answered {endpoint} with HTTP {}", status.as_u16()))
                .with_context(json!({ "endpoint": endpoint, "status": status.as_u16() })),
        );
    }
    Ok(response)
}
