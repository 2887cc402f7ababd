//! Configuration loading from disk and the environment.

use secrecy::SecretString;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{Environment, GuardConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment and validate the result.
///
/// Development-mode soft warnings are left to the caller, which logs them
/// once the subscriber is installed.
pub fn load_config(path: Option<&Path>) -> Result<GuardConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<GuardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GuardConfig::default(),
    };

    apply_env(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// This is the only place the service reads its environment.
pub fn apply_env<F>(config: &mut GuardConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(env) = var("APP_ENV").and_then(|v| Environment::parse(&v)) {
        config.environment = env;
    }
    if let Some(bind) = var("SITE_GUARD_BIND") {
        config.listener.bind_address = bind;
    }
    if let Some(url) = var("WORDPRESS_API_URL").or_else(|| var("NEXT_PUBLIC_WORDPRESS_API_URL")) {
        config.provider.base_url = Some(url);
    }
    if let Some(user) = var("WORDPRESS_AUTH_USER") {
        config.provider.auth_user = Some(user);
    }
    if let Some(pass) = var("WORDPRESS_AUTH_PASS") {
        config.provider.auth_pass = Some(SecretString::from(pass));
    }
    if let Some(code) = var("COCKPIT_ACCESS_CODE") {
        config.cockpit.access_code = Some(SecretString::from(code));
    }
    if let Some(secret) = var("SESSION_SECRET") {
        config.session.secret = Some(SecretString::from(secret));
    }
    if let Some(key) = var("ADMIN_API_KEY") {
        config.admin.api_key = Some(SecretString::from(key));
    }
}
