//! Login, logout and session checks.

use cookie::{time::Duration, Cookie, CookieJar, SameSite};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::GuardConfig;
use crate::error::{log_error, messages, AppError, AppResult};
use crate::observability::{metrics, SecureLogger};
use crate::provider::IdentityClient;
use crate::session::credentials::Credentials;
use crate::session::token::{SessionClaims, SessionSigner};

/// How a login attempt ended. Drives the HTTP status, never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    /// The form input failed format checks.
    Invalid,
    /// The provider refused or could not be asked.
    Denied,
    /// The session could not be issued.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub outcome: LoginOutcome,
}

impl LoginResult {
    fn authenticated() -> Self {
        Self {
            success: true,
            error: None,
            outcome: LoginOutcome::Authenticated,
        }
    }

    fn failure(outcome: LoginOutcome, error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            outcome,
        }
    }
}

pub struct SessionController {
    identity: IdentityClient,
    signer: SessionSigner,
    clock: Arc<dyn Clock>,
    logger: SecureLogger,
    cookie_name: String,
    max_age_secs: u64,
    secure: bool,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("cookie_name", &self.cookie_name)
            .field("max_age_secs", &self.max_age_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Without a configured secret a random key is used and sessions do
    /// not survive a restart. Configuration validation requires the secret
    /// in production.
    pub fn new(
        config: &GuardConfig,
        identity: IdentityClient,
        clock: Arc<dyn Clock>,
        logger: SecureLogger,
    ) -> Self {
        let signer = match &config.session.secret {
            Some(secret) => SessionSigner::new(secret.expose_secret().as_bytes()),
            None => {
                logger.warn("No session secret configured, using an ephemeral key", None);
                SessionSigner::ephemeral()
            }
        };

        Self {
            identity,
            signer,
            clock,
            logger,
            cookie_name: config.session.cookie_name.clone(),
            max_age_secs: config.session.max_age_secs,
            secure: config.secure_cookies(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Verify credentials with the provider and, on success, set the
    /// session cookie on `jar`.
    ///
    /// Provider detail never reaches the result: it is logged and the
    /// caller sees `ACCESS DENIED`.
    pub async fn login(&self, jar: &mut CookieJar, username: &str, password: &str) -> LoginResult {
        let credentials = match Credentials::parse(username, password) {
            Ok(credentials) => credentials,
            Err(err) => {
                metrics::record_login("invalid");
                return LoginResult::failure(
                    LoginOutcome::Invalid,
                    err.safe_message(messages::ACCESS_DENIED),
                );
            }
        };

        if let Err(err) = self.identity.verify(&credentials).await {
            log_error(
                &self.logger,
                &err,
                Some(json!({ "action": "login", "username": credentials.username })),
            );
            metrics::record_login("denied");
            return LoginResult::failure(
                LoginOutcome::Denied,
                err.safe_message(messages::ACCESS_DENIED),
            );
        }

        match self.issue(jar, &credentials.username) {
            Ok(()) => {
                metrics::record_login("success");
                self.logger.info(
                    "Login succeeded",
                    Some(&json!({ "username": credentials.username })),
                );
                LoginResult::authenticated()
            }
            Err(err) => {
                log_error(&self.logger, &err, Some(json!({ "action": "login" })));
                metrics::record_login("error");
                LoginResult::failure(
                    LoginOutcome::Failed,
                    err.safe_message(messages::GENERIC_FAILURE),
                )
            }
        }
    }

    fn issue(&self, jar: &mut CookieJar, subject: &str) -> AppResult<()> {
        let claims = SessionClaims::new(subject, self.clock.now_secs(), self.max_age_secs);
        let token = self.signer.sign(&claims)?;
        let max_age = i64::try_from(self.max_age_secs)
            .map_err(|_| AppError::system("Session max age out of range"))?;

        let cookie = Cookie::build((self.cookie_name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::seconds(max_age))
            .build();
        jar.add(cookie);
        Ok(())
    }

    /// Claims of a valid, unexpired session cookie.
    pub fn current_session(&self, jar: &CookieJar) -> Option<SessionClaims> {
        let cookie = jar.get(&self.cookie_name)?;
        self.signer.verify(cookie.value(), self.clock.now_secs())
    }

    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.current_session(jar).is_some()
    }

    /// Clear the session cookie. Idempotent.
    pub fn logout(&self, jar: &mut CookieJar) {
        let removal = Cookie::build((self.cookie_name.clone(), ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::ZERO)
            .build();
        jar.add(removal);
    }
}
