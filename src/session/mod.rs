//! Admin session management.
//!
//! # Data Flow
//! ```text
//! POST /api/auth/login
//!     → credentials.rs (trim, format checks)
//!     → provider::identity (Basic Auth against users/me)
//!     → token.rs (sign claims) → Set-Cookie admin_session
//!
//! Protected request
//!     → controller.rs (verify signature and expiry) → claims in extensions
//! ```
//!
//! # Design Decisions
//! - The cookie is an HMAC-signed token, not a bare flag
//! - Provider credentials are never stored
//! - Session state lives only in the cookie; logout clears it client-side

pub mod cockpit;
pub mod controller;
pub mod credentials;
pub mod token;

pub use cockpit::CockpitGate;
pub use controller::{LoginOutcome, LoginResult, SessionController};
pub use credentials::Credentials;
pub use token::{SessionClaims, SessionSigner};
