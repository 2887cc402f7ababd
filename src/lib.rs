//! Security and session layer for a WordPress-backed site.
//!
//! Sits between the browser and the WordPress REST API and owns the
//! security-sensitive paths: admin login and sessions, CSRF protection,
//! login rate limiting, sanitization of user content, the error policy
//! that keeps internals away from callers, and redacted logging.

pub mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod security;
pub mod session;

pub use config::GuardConfig;
pub use error::{AppError, AppResult};
pub use http::{AppState, GuardServer};
pub use lifecycle::Shutdown;
