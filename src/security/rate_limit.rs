//! Fixed-window rate limiting for sensitive actions.
//!
//! Each identifier (client IP, optionally prefixed by action) gets a
//! counter and a reset deadline. The first attempt after the deadline
//! opens a new window. Check-and-increment happens under the map's entry
//! lock, so concurrent attempts for one identifier never both slip past the
//! limit.
//!
//! State is per process. Several replicas behind a load balancer each keep
//! their own counters.

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::error::messages;
use crate::observability::metrics;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_at: u64,
}

impl RateLimitResult {
    /// Whole seconds until the window resets, at least 1.
    pub fn retry_after_secs(&self, now_millis: u64) -> u64 {
        self.reset_at.saturating_sub(now_millis).div_ceil(1000).max(1)
    }

    /// `X-RateLimit-*` headers, plus `Retry-After` when rejected.
    pub fn headers(&self, now_millis: u64) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(self.limit),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderValue::from(self.reset_at / 1000),
        );
        if !self.success {
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(self.retry_after_secs(now_millis)),
            );
        }
        headers
    }

    /// 429 response with the rate-limit headers and a generic message.
    pub fn into_rejection(self, now_millis: u64) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": messages::TOO_MANY_ATTEMPTS,
        });
        (StatusCode::TOO_MANY_REQUESTS, self.headers(now_millis), Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    attempts: u32,
    reset_at: u64,
}

pub struct RateLimiter {
    windows: DashMap<String, Window>,
    clock: Arc<dyn Clock>,
    default_limit: u32,
    default_window_ms: u64,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("entries", &self.windows.len())
            .field("default_limit", &self.default_limit)
            .field("default_window_ms", &self.default_window_ms)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
            default_limit: config.limit,
            default_window_ms: config.window_ms,
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.max(1)),
            sweeper: Mutex::new(None),
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Record an attempt using the configured limit and window.
    pub fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_with(identifier, self.default_limit, self.default_window_ms)
    }

    /// Record an attempt against `limit` per `window_ms`.
    pub fn check_with(&self, identifier: &str, limit: u32, window_ms: u64) -> RateLimitResult {
        let now = self.clock.now_millis();
        let fresh = Window {
            attempts: 1,
            reset_at: now + window_ms,
        };
        let allowed = |window: &Window| RateLimitResult {
            success: true,
            limit,
            remaining: limit.saturating_sub(window.attempts),
            reset_at: window.reset_at,
        };

        match self.windows.entry(identifier.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                allowed(&fresh)
            }
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();
                if now > window.reset_at {
                    *window = fresh;
                    return allowed(window);
                }
                if window.attempts >= limit {
                    return RateLimitResult {
                        success: false,
                        limit,
                        remaining: 0,
                        reset_at: window.reset_at,
                    };
                }
                window.attempts += 1;
                allowed(window)
            }
        }
    }

    /// Forget an identifier.
    pub fn reset(&self, identifier: &str) {
        self.windows.remove(identifier);
    }

    /// Status without recording an attempt. An unknown or elapsed
    /// identifier reports a full allowance.
    pub fn peek_status(&self, identifier: &str, limit: u32) -> RateLimitResult {
        let now = self.clock.now_millis();
        match self.windows.get(identifier) {
            Some(window) if now <= window.reset_at => RateLimitResult {
                success: window.attempts < limit,
                limit,
                remaining: limit.saturating_sub(window.attempts),
                reset_at: window.reset_at,
            },
            _ => RateLimitResult {
                success: true,
                limit,
                remaining: limit,
                reset_at: now + self.default_window_ms,
            },
        }
    }

    /// Drop every elapsed window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.windows.len();
        self.windows.retain(|_, window| now <= window.reset_at);
        let removed = before.saturating_sub(self.windows.len());
        metrics::record_rate_limit_entries(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.windows.len(), "Swept rate limit windows");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Spawn the periodic sweeper. Calling it again while one is running
    /// does nothing. Must run inside a Tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let limiter: Weak<Self> = Arc::downgrade(self);
        let period = self.sweep_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                limiter.sweep();
            }
        }));
        tracing::debug!(interval_secs = period.as_secs(), "Rate limit sweeper started");
    }

    /// Stop the sweeper. Safe to call when it is not running.
    pub fn stop(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Rate limit sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
