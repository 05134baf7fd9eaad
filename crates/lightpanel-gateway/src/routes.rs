//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{config, login, settings};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /` - Login page, or redirect to `/settings` with a live session
/// - `POST /login` - Password form submission
///
/// ## Session required
/// - `POST /logout` - End the session
/// - `GET /settings` - Settings editor page
/// - `GET /api/config` - Current configuration, without the password hash
/// - `POST /api/config` - Validate, save and hot-reload a configuration
/// - `POST /api/test-connection` - Check a remote URL and token
pub fn create_router(state: GatewayState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        .route("/", get(login::index))
        .route("/login", post(login::login))
        .route("/logout", post(login::logout))
        .route("/settings", get(settings::settings))
        .route(
            "/api/config",
            get(config::get_config).post(config::update_config),
        )
        .route("/api/test-connection", post(config::test_connection))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
