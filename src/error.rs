//! Trusted vs system errors.
//!
//! A [`AppError::Trusted`] message is safe to show the caller verbatim
//! (validation failures). A [`AppError::System`] message and context never
//! leave the server: callers get a generic string from [`safe_message`] and
//! the detail goes to the secure logger through [`log_error`].
//!
//! [`safe_message`]: AppError::safe_message

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::observability::SecureLogger;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Generic caller-facing strings used in place of system error messages.
pub mod messages {
    pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";
    pub const ACCESS_DENIED: &str = "ACCESS DENIED";
    pub const TOO_MANY_ATTEMPTS: &str = "Too many attempts, please try again later.";
    pub const INVALID_FORM: &str = "Invalid or expired form, please reload the page.";
    pub const UNAUTHORIZED: &str = "Authentication required.";
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Validation or user-facing failure; the message may be displayed.
    #[error("{message}")]
    Trusted { message: String },

    /// Internal or dependency failure; the message must be masked.
    #[error("{message}")]
    System {
        message: String,
        context: Option<Value>,
        #[source]
        source: Option<BoxError>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn trusted(message: impl Into<String>) -> Self {
        AppError::Trusted {
            message: message.into(),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        AppError::System {
            message: message.into(),
            context: None,
            source: None,
        }
    }

    /// Attach structured context. Object keys merge into existing context,
    /// later keys win. No-op on trusted errors.
    pub fn with_context(mut self, value: Value) -> Self {
        if let AppError::System { context, .. } = &mut self {
            match context {
                Some(Value::Object(existing)) if value.is_object() => {
                    if let Value::Object(extra) = value {
                        existing.extend(extra);
                    }
                }
                _ => *context = Some(value),
            }
        }
        self
    }

    /// Attach the underlying cause. No-op on trusted errors.
    pub fn with_source(mut self, err: impl Into<BoxError>) -> Self {
        if let AppError::System { source, .. } = &mut self {
            *source = Some(err.into());
        }
        self
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, AppError::Trusted { .. })
    }

    /// The message to hand to the caller: verbatim when trusted, otherwise
    /// `fallback`. Every caller-facing failure path goes through here.
    pub fn safe_message(&self, fallback: &str) -> String {
        match self {
            AppError::Trusted { message } => message.clone(),
            AppError::System { .. } => fallback.to_string(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Trusted { .. } => "trusted",
            AppError::System { .. } => "system",
        }
    }

    fn source_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }
}

pub fn is_trusted_error(err: &AppError) -> bool {
    err.is_trusted()
}

pub fn get_safe_error_message(err: &AppError, fallback: &str) -> String {
    err.safe_message(fallback)
}

/// Log the full error at error level. Sensitive keys anywhere in the
/// context are redacted by the logger.
pub fn log_error(logger: &SecureLogger, err: &AppError, context: Option<Value>) {
    let error_context = match err {
        AppError::System { context, .. } => context.clone(),
        AppError::Trusted { .. } => None,
    };
    let details = json!({
        "kind": err.kind(),
        "message": err.to_string(),
        "source": err.source_chain(),
        "error_context": error_context,
        "context": context,
    });
    let title = if err.is_trusted() { "Trusted Error" } else { "System Error" };
    logger.error(title, Some(&details));
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Upstream request timed out"
        } else if err.is_connect() {
            "Upstream connection failed"
        } else {
            "Upstream request failed"
        };
        AppError::system(message).with_source(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.is_trusted() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = json!({
            "success": false,
            "error": self.safe_message(messages::GENERIC_FAILURE),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_system_message_is_masked() {
        let err = AppError::system("db exploded");
        assert_eq!(err.safe_message("generic"), "generic");
        assert_eq!(get_safe_error_message(&err, "generic"), "generic");
        assert!(!is_trusted_error(&err));
    }

    #[test]
    fn test_trusted_message_passes_through() {
        let err = AppError::trusted("title required");
        assert_eq!(err.safe_message("generic"), "title required");
        assert!(is_trusted_error(&err));
    }

    #[test]
    fn test_context_and_source_ignored_on_trusted() {
        let err = AppError::trusted("bad slug")
            .with_context(json!({ "slug": "x" }))
            .with_source(std::io::Error::other("boom"));
        assert!(matches!(err, AppError::Trusted { .. }));
    }

    #[test]
    fn test_context_objects_merge() {
        let err = AppError::system("upstream")
            .with_context(json!({ "status": 502, "endpoint": "posts" }))
            .with_context(json!({ "endpoint": "users/me" }));
        match err {
            AppError::System { context: Some(context), .. } => {
                assert_eq!(context, json!({ "status": 502, "endpoint": "users/me" }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_log_error_includes_detail_and_redacts() {
        let sink = Arc::new(MemorySink::new());
        let logger = SecureLogger::new(false, sink.clone());

        let err = AppError::system("provider rejected credentials")
            .with_context(json!({ "status": 401, "authorization": "Basic Ym9iOnB3" }))
            .with_source(std::io::Error::other("connection reset"));
        log_error(&logger, &err, Some(json!({ "username": "bob" })));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "System Error");
        assert!(sink.contains("provider rejected credentials"));
        assert!(sink.contains("connection reset"));
        assert!(sink.contains("bob"));
        assert!(!sink.contains("Ym9iOnB3"));
    }

    #[tokio::test]
    async fn test_into_response_masks_system_errors() {
        let response = AppError::system("secret internals").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(messages::GENERIC_FAILURE));
        assert!(!text.contains("secret internals"));
    }
}
