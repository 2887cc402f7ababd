//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, security headers)
//! - Serve until shutdown, running the rate-limit sweeper alongside

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::clock::{Clock, SystemClock};
use crate::config::GuardConfig;
use crate::error::AppResult;
use crate::http::handlers::{self, auth, cockpit, content};
use crate::http::middleware::require_auth;
use crate::lifecycle::ShutdownSignal;
use crate::observability::SecureLogger;
use crate::provider::{build_http_client, ContentClient, IdentityClient};
use crate::security::csrf::CsrfGuard;
use crate::security::headers::{https_redirect, security_headers, SecurityHeaders};
use crate::security::rate_limit::RateLimiter;
use crate::session::{CockpitGate, SessionController};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    pub logger: SecureLogger,
    pub csrf: Arc<CsrfGuard>,
    pub limiter: Arc<RateLimiter>,
    pub sessions: Arc<SessionController>,
    pub content: Arc<ContentClient>,
    pub cockpit: Arc<CockpitGate>,
}

impl AppState {
    pub fn new(config: GuardConfig, logger: SecureLogger) -> AppResult<Self> {
        Self::with_clock(config, logger, Arc::new(SystemClock))
    }

    /// State whose rate limiter and sessions read time from `clock`.
    pub fn with_clock(config: GuardConfig, logger: SecureLogger, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let http = build_http_client(&config.provider)?;
        let identity = IdentityClient::new(http.clone(), &config.provider);
        let content = ContentClient::new(http, &config.provider, logger.clone());
        let sessions = SessionController::new(&config, identity, clock.clone(), logger.clone());

        Ok(Self {
            csrf: Arc::new(CsrfGuard::new(&config)),
            limiter: Arc::new(RateLimiter::with_clock(&config.rate_limit, clock)),
            sessions: Arc::new(sessions),
            content: Arc::new(content),
            cockpit: Arc::new(CockpitGate::new(&config.cockpit)),
            logger,
            config: Arc::new(config),
        })
    }
}

/// Build the router with every route and middleware layer.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let protected = Router::new()
        .route("/api/admin/posts", post(content::create_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/csrf", get(auth::csrf_token))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session_status))
        .route("/api/posts", get(content::list_posts))
        .route("/api/posts/{slug}", get(content::get_post))
        .route("/api/categories", get(content::list_categories))
        .route("/api/cockpit/unlock", post(cockpit::unlock))
        .merge(protected);

    if config.admin.enabled {
        app = app.merge(admin::router(state.clone()));
    }

    let mut app = app.with_state(state);

    if config.security.enable_headers {
        let policy = Arc::new(SecurityHeaders::new(&config));
        app = app.layer(middleware::from_fn_with_state(policy, security_headers));
    }
    if config.is_production() && config.security.force_https {
        app = app.layer(middleware::from_fn(https_redirect));
    }

    app.layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP server for the site guard.
pub struct GuardServer {
    router: Router,
    state: AppState,
}

impl GuardServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.state.config.environment,
            "HTTP server starting"
        );

        self.state.limiter.start();

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await;

        self.state.limiter.stop();
        tracing::info!("HTTP server stopped");
        result
    }
}
