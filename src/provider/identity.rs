//! Credential verification against the provider.

use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::provider::{endpoint_url, send_tracked};
use crate::session::Credentials;

const ENDPOINT: &str = "users/me";

#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
    base_url: Option<String>,
}

impl IdentityClient {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url().map(str::to_string),
        }
    }

    /// Ask the provider whether `credentials` are valid.
    ///
    /// Only an HTTP 200 from `users/me` counts as success. Everything else,
    /// including network failures and timeouts, is a system error.
    pub async fn verify(&self, credentials: &Credentials) -> AppResult<()> {
        let url = endpoint_url(self.base_url.as_deref(), ENDPOINT)?;
        let request = self
            .http
            .get(url)
            .basic_auth(&credentials.username, Some(credentials.password.expose_secret()))
            .header(header::CACHE_CONTROL, "no-store");

        let response = send_tracked(ENDPOINT, request).await.map_err(|err| {
            err.with_context(json!({ "endpoint": ENDPOINT, "username": credentials.username }))
        })?;

        if response.status() != StatusCode::OK {
            return Err(AppError::system("Identity provider did not confirm credentials")
                .with_context(json!({ "status": response.status().as_u16() })));
        }
        Ok(())
    }
}
