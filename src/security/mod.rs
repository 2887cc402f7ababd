//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (HTTPS redirect, response security headers)
//!     → rate_limit.rs (per-client fixed window on sensitive actions)
//!     → csrf.rs (double-submit token check on state-changing forms)
//!     → sanitize.rs (user HTML and text before it is stored or rendered)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or malformed token is a rejection
//! - No trust in client input
//! - Secret comparisons are constant-time

pub mod csrf;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;

use subtle::ConstantTimeEq;

/// Constant-time equality for secrets. Unequal lengths return early, which
/// only reveals the length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
