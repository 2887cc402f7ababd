//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Trigger → server stops accepting → in-flight requests drain → sweeper stops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Config is loaded and validated before anything binds
//! - The rate-limit sweeper lives exactly as long as the server

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{spawn_signal_listener, wait_for_termination};
