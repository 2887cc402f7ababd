//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing events, redacted secure-log records)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (JSON in production)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Anything carrying caller input goes through `SecureLogger`, never raw `tracing`
//! - Request ID flows through spans via tower-http
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::{LogLevel, LogRecord, LogSink, MemorySink, SecureLogger, TracingSink};
