//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, body limit)
//!     → security headers / HTTPS redirect
//!     → request.rs (client identifier for rate limiting)
//!     → cookies.rs (jar in, Set-Cookie out)
//!     → middleware/ (session gate for admin routes)
//!     → handlers/ (auth, content, cockpit)
//!     → Send to client
//! ```

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use cookies::Cookies;
pub use request::ClientId;
pub use server::{build_router, AppState, GuardServer};
