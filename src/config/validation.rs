//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Missing provider settings are
//! fatal in production and only reported as warnings in development, where
//! the service still starts and simply fails closed at request time.

use secrecy::ExposeSecret;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GuardConfig;

/// Minimum length of the session HMAC key.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// A configuration problem that prevents startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("provider.base_url is required in production")]
    MissingProviderUrl,

    #[error("provider.base_url '{0}' is not an absolute http(s) URL")]
    InvalidProviderUrl(String),

    #[error("provider.timeout_secs must be greater than zero")]
    ZeroProviderTimeout,

    #[error("session.secret is required in production")]
    MissingSessionSecret,

    #[error("session.secret must be at least {} bytes", MIN_SESSION_SECRET_LEN)]
    WeakSessionSecret,

    #[error("{0}.limit and {0}.window_ms must be greater than zero")]
    InvalidRateLimit(&'static str),

    #[error("admin.api_key is required when the admin API is enabled")]
    MissingAdminKey,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let production = config.is_production();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match config.provider.base_url() {
        Some(url) if !is_http_url(url) => {
            errors.push(ValidationError::InvalidProviderUrl(url.to_string()));
        }
        None if production => errors.push(ValidationError::MissingProviderUrl),
        _ => {}
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProviderTimeout);
    }

    match &config.session.secret {
        Some(secret) if secret.expose_secret().len() < MIN_SESSION_SECRET_LEN => {
            errors.push(ValidationError::WeakSessionSecret);
        }
        None if production => errors.push(ValidationError::MissingSessionSecret),
        _ => {}
    }

    if config.rate_limit.limit == 0 || config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::InvalidRateLimit("rate_limit"));
    }
    if config.cockpit.limit == 0 || config.cockpit.window_ms == 0 {
        errors.push(ValidationError::InvalidRateLimit("cockpit"));
    }

    if config.admin.enabled && config.admin.api_key.is_none() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal findings worth logging at startup.
pub fn soft_warnings(config: &GuardConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.is_production() {
        return warnings;
    }
    if config.provider.base_url().is_none() {
        warnings.push("provider.base_url is not set; logins will be denied and content reads return empty");
    }
    if config.session.secret.is_none() {
        warnings.push("session.secret is not set; an ephemeral key is used and sessions end on restart");
    }
    if config.cockpit.access_code.is_none() {
        warnings.push("cockpit.access_code is not set; cockpit unlock always fails");
    }
    warnings
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
