//! Double-submit CSRF protection.
//!
//! A fresh token is written to an HTTP-only, `SameSite=Strict` cookie and
//! handed to the page for a hidden form field. On submit both copies must
//! be present and equal. Tokens are never stored server-side.

use cookie::{time::Duration, Cookie, CookieJar, SameSite};
use rand::{rngs::OsRng, RngCore};

use crate::config::GuardConfig;
use crate::security::constant_time_eq;

/// Random bytes per token. Rendered as lowercase hex.
pub const TOKEN_BYTES: usize = 32;

/// Name of the hidden form field carrying the submitted token.
pub const FORM_FIELD: &str = "csrf_token";

#[derive(Debug, Clone)]
pub struct CsrfGuard {
    cookie_name: String,
    max_age_secs: u64,
    secure: bool,
}

impl CsrfGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            cookie_name: config.csrf.cookie_name.clone(),
            max_age_secs: config.csrf.max_age_secs,
            secure: config.secure_cookies(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Generate a new token, set it on `jar` and return it.
    ///
    /// Any previously issued token stops verifying.
    pub fn generate_token(&self, jar: &mut CookieJar) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let cookie = Cookie::build((self.cookie_name.clone(), token.clone()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::seconds(self.max_age_secs as i64))
            .build();
        jar.add(cookie);
        token
    }

    /// Check a submitted token against the cookie copy.
    ///
    /// False when either side is missing or empty, the lengths differ, or
    /// either side is not valid hex.
    pub fn verify_token(&self, jar: &CookieJar, submitted: Option<&str>) -> bool {
        let Some(submitted) = submitted.filter(|s| !s.is_empty()) else {
            return false;
        };
        let Some(stored) = self.peek_token(jar) else {
            return false;
        };
        if submitted.len() != stored.len() {
            return false;
        }

        match (hex::decode(submitted), hex::decode(&stored)) {
            (Ok(submitted), Ok(stored)) => constant_time_eq(&submitted, &stored),
            _ => false,
        }
    }

    /// Current cookie token, if any. Never generates one.
    pub fn peek_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}
