//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive `Deserialize` so a TOML file can provide any subset.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Deployment mode. Controls `Secure` cookies, debug log suppression and
/// how strictly missing settings are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Parse the usual spellings found in `APP_ENV` / `NODE_ENV`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" | "test" => Some(Environment::Development),
            _ => None,
        }
    }
}

/// Root configuration for the guard service.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Production or development mode.
    pub environment: Environment,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Identity/content provider (WordPress REST API).
    pub provider: ProviderConfig,

    /// Session cookie policy.
    pub session: SessionConfig,

    /// CSRF cookie policy.
    pub csrf: CsrfConfig,

    /// Login rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Cockpit access code check.
    pub cockpit: CockpitConfig,

    /// Admin API.
    pub admin: AdminConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GuardConfig {
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Cookies carry the `Secure` flag only in production.
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Use the first `X-Forwarded-For` entry as the client identifier.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// WordPress REST API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL, e.g. `https://cms.example.com/wp-json/wp/v2`.
    pub base_url: Option<String>,

    /// Server-only user for write calls (application password user).
    pub auth_user: Option<String>,

    /// Server-only application password.
    #[serde(deserialize_with = "deserialize_secret")]
    pub auth_pass: Option<SecretString>,

    /// Bound for every outbound call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_user: None,
            auth_pass: None,
            timeout_secs: 5,
        }
    }
}

impl ProviderConfig {
    /// Base URL without a trailing slash, or `None` when unset/blank.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// Origin (scheme + host + port) of the base URL, for CSP.
    pub fn origin(&self) -> Option<String> {
        let parsed = url::Url::parse(self.base_url()?).ok()?;
        Some(parsed.origin().ascii_serialization()).filter(|origin| origin != "null")
    }
}

/// Session cookie policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,

    /// Lifetime of the session cookie and token, in seconds.
    pub max_age_secs: u64,

    /// HMAC key for session tokens. Required in production.
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: Option<SecretString>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "admin_session".to_string(),
            max_age_secs: 8 * 60 * 60,
            secret: None,
        }
    }
}

/// CSRF cookie policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    pub cookie_name: String,
    pub max_age_secs: u64,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: "csrf_token".to_string(),
            max_age_secs: 2 * 60 * 60,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on the login path.
    pub enabled: bool,

    /// Attempts allowed per window.
    pub limit: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// How often elapsed entries are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 5,
            window_ms: 60 * 1000,
            sweep_interval_secs: 5 * 60,
        }
    }
}

/// Cockpit access code check.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CockpitConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_code: Option<SecretString>,

    /// Unlock attempts allowed per window.
    pub limit: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for CockpitConfig {
    fn default() -> Self {
        Self {
            access_code: None,
            limit: 5,
            window_ms: 60 * 1000,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin router.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers (CSP and friends).
    pub enable_headers: bool,

    /// Redirect plain HTTP to HTTPS in production.
    pub force_https: bool,

    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            force_https: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_match_cookie_policy() {
        let config = GuardConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.session.cookie_name, "admin_session");
        assert_eq!(config.session.max_age_secs, 28_800);
        assert_eq!(config.csrf.cookie_name, "csrf_token");
        assert_eq!(config.csrf.max_age_secs, 7_200);
        assert_eq!(config.rate_limit.limit, 5);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.sweep_interval_secs, 300);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Some(Environment::Production));
        assert_eq!(Environment::parse(" Prod "), Some(Environment::Production));
        assert_eq!(Environment::parse("development"), Some(Environment::Development));
        assert_eq!(Environment::parse("staging"), None);
    }

    #[test]
    fn test_partial_toml() {
        let config: GuardConfig = toml::from_str(
            r#"
            environment = "production"

            [provider]
            base_url = "https://cms.example.com/wp-json/wp/v2/"
            auth_pass = "app-password"

            [rate_limit]
            limit = 3
            "#,
        )
        .unwrap();

        assert!(config.secure_cookies());
        assert_eq!(config.provider.base_url(), Some("https://cms.example.com/wp-json/wp/v2"));
        assert_eq!(
            config.provider.auth_pass.as_ref().map(|s| s.expose_secret().to_string()),
            Some("app-password".to_string())
        );
        assert_eq!(config.rate_limit.limit, 3);
        assert_eq!(config.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn test_provider_origin() {
        let provider = ProviderConfig {
            base_url: Some("https://cms.example.com:8443/wp-json/wp/v2".into()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.origin().as_deref(), Some("https://cms.example.com:8443"));

        let blank = ProviderConfig {
            base_url: Some("   ".into()),
            ..ProviderConfig::default()
        };
        assert_eq!(blank.origin(), None);
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let config: GuardConfig = toml::from_str(
            r#"
            [session]
            secret = "super-secret-session-key-material"
            "#,
        )
        .unwrap();
        let printed = format!("{:?}", config.session);
        assert!(!printed.contains("super-secret-session-key-material"));
    }
}
