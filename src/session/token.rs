//! Signed session tokens.
//!
//! Format: `base64url(json claims) "." base64url(HMAC-SHA256(json claims))`.
//! The cookie never holds the provider credentials, only these claims.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use ring::hmac;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider username the session was issued to.
    pub sub: String,
    /// Random session identifier.
    pub sid: Uuid,
    /// Issued-at, epoch seconds.
    pub iat: u64,
    /// Expiry, epoch seconds.
    pub exp: u64,
}

impl SessionClaims {
    pub fn new(subject: &str, now_secs: u64, ttl_secs: u64) -> Self {
        Self {
            sub: subject.to_string(),
            sid: Uuid::new_v4(),
            iat: now_secs,
            exp: now_secs + ttl_secs,
        }
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs >= self.exp
    }
}

#[derive(Debug, Clone)]
pub struct SessionSigner {
    key: hmac::Key,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Signer with a random key. Sessions die with the process.
    pub fn ephemeral() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::new(&secret)
    }

    pub fn sign(&self, claims: &SessionClaims) -> AppResult<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AppError::system("Failed to encode session claims").with_source(e))?;
        let tag = hmac::sign(&self.key, &payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag.as_ref())
        ))
    }

    /// Claims of a well-formed, correctly signed, unexpired token.
    pub fn verify(&self, token: &str, now_secs: u64) -> Option<SessionClaims> {
        let (payload, tag) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
        hmac::verify(&self.key, &payload, &tag).ok()?;

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        (!claims.is_expired(now_secs)).then_some(claims)
    }
}
