//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber (JSON in production, pretty in development)
//! - Provide the secure logger used for records that carry untrusted context
//! - Redact sensitive keys before anything reaches a sink
//!
//! # Design Decisions
//! - Redaction walks JSON values recursively, bounded at depth 10
//! - Debug and info records are dropped outside development mode
//! - Sinks are pluggable so tests can capture emitted records

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::GuardConfig;

/// Replacement for the value of any sensitive key.
pub const REDACTED: &str = "[REDACTED]";

/// Replacement for anything nested deeper than [`MAX_DEPTH`].
pub const MAX_DEPTH_MARKER: &str = "[MAX_DEPTH_REACHED]";

const MAX_DEPTH: usize = 10;

/// `tracing` target for records emitted by [`SecureLogger`].
pub const AUDIT_TARGET: &str = "site_guard::audit";

/// Matched as lowercase substrings of each key.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "auth",
    "credentials",
    "apikey",
    "api_key",
    "accesstoken",
    "access_token",
    "refreshtoken",
    "refresh_token",
    "sessiontoken",
    "session_token",
    "csrftoken",
    "csrf_token",
    "privatekey",
    "private_key",
    "secretkey",
    "secret_key",
];

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over `observability.log_level` when set.
pub fn init(config: &GuardConfig) {
    let level = &config.observability.log_level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("site_guard={level},tower_http={level}")));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.is_production() {
        registry
            .with(fmt::layer().json().flatten_event(true).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single structured log record, already redacted.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LogRecord {
    fn new(level: LogLevel, message: &str, context: Option<&Value>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            message: message.to_string(),
            context: context.map(redact),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Forwards records to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let rendered = record.to_json();
        match record.level {
            LogLevel::Debug => tracing::debug!(target: AUDIT_TARGET, record = %rendered, "{}", record.message),
            LogLevel::Info => tracing::info!(target: AUDIT_TARGET, record = %rendered, "{}", record.message),
            LogLevel::Warn => tracing::warn!(target: AUDIT_TARGET, record = %rendered, "{}", record.message),
            LogLevel::Error => tracing::error!(target: AUDIT_TARGET, record = %rendered, "{}", record.message),
        }
    }
}

/// Keeps records in memory. Used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// True if any rendered record contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|r| r.to_json().contains(needle))
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}

/// Redacting logger shared by every component.
#[derive(Clone)]
pub struct SecureLogger {
    dev_mode: bool,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for SecureLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureLogger")
            .field("dev_mode", &self.dev_mode)
            .finish_non_exhaustive()
    }
}

impl SecureLogger {
    pub fn new(dev_mode: bool, sink: Arc<dyn LogSink>) -> Self {
        Self { dev_mode, sink }
    }

    /// Logger backed by [`TracingSink`].
    pub fn tracing(dev_mode: bool) -> Self {
        Self::new(dev_mode, Arc::new(TracingSink))
    }

    pub fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        if !self.dev_mode && matches!(level, LogLevel::Debug | LogLevel::Info) {
            return;
        }
        self.sink.emit(&LogRecord::new(level, message, context));
    }

    pub fn debug(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Debug, message, context);
    }

    pub fn info(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Info, message, context);
    }

    pub fn warn(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Warn, message, context);
    }

    pub fn error(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Error, message, context);
    }
}

/// Return a copy of `value` with every sensitive key's value replaced.
pub fn redact(value: &Value) -> Value {
    redact_at(value, 0)
}

fn redact_at(value: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(MAX_DEPTH_MARKER.to_string());
    }
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_at(v, depth + 1)).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let redacted = if is_sensitive_key(key) {
                    Value::String(REDACTED.to_string())
                } else if value.is_object() || value.is_array() {
                    redact_at(value, depth + 1)
                } else {
                    value.clone()
                };
                out.insert(key.clone(), redacted);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|needle| lower.contains(needle))
}
