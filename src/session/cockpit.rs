//! Shared access code for the cockpit area.

use secrecy::{ExposeSecret, SecretString};

use crate::config::CockpitConfig;
use crate::security::constant_time_eq;

#[derive(Debug, Clone)]
pub struct CockpitGate {
    access_code: Option<SecretString>,
}

impl CockpitGate {
    pub fn new(config: &CockpitConfig) -> Self {
        Self {
            access_code: config.access_code.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_code.is_some()
    }

    /// Constant-time check of a submitted code. Always false when no code
    /// is configured or the submission is blank.
    pub fn verify(&self, submitted: &str) -> bool {
        let Some(expected) = &self.access_code else {
            return false;
        };
        let submitted = submitted.trim();
        !submitted.is_empty() && constant_time_eq(submitted.as_bytes(), expected.expose_secret().as_bytes())
    }
}
