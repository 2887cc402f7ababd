//! Route handlers.

pub mod auth;
pub mod cockpit;
pub mod content;

use axum::Json;
use serde_json::{json, Value};

/// `{ "success": false, "error": message }`
pub fn failure_body(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "error": message }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
