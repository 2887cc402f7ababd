//! Client identification for rate limiting.
//!
//! # Design Decisions
//! - The socket peer address is the default identifier
//! - `X-Forwarded-For` / `X-Real-IP` are only honoured when
//!   `listener.trust_forwarded_for` is set, since clients can forge them
//! - Requests with no usable address share the `"unknown"` bucket

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::http::server::AppState;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientId(client_identifier(
            &parts.headers,
            peer,
            state.config.listener.trust_forwarded_for,
        )))
    }
}
