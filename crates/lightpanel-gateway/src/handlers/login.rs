//! Login, logout and the landing page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use lightpanel_auth::check_password;

use crate::auth::{clear_cookie, cookie_value, session_cookie, SessionUser};
use crate::error::ApiError;
use crate::pages;
use crate::state::GatewayState;

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Submitted password.
    #[serde(default)]
    pub password: String,
}

/// `GET /`: login form, or straight to settings with a live session.
pub async fn index(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    let logged_in = cookie_value(&headers, &state.config.cookie_name)
        .is_some_and(|token| state.sessions.validate(&token));
    if logged_in {
        Redirect::to("/settings").into_response()
    } else {
        Html(pages::login(None)).into_response()
    }
}

/// `POST /login`: check the password and issue a session cookie.
///
/// A failed attempt is answered only after a fixed delay.
///
/// # Errors
///
/// Returns [`ApiError::InvalidPassword`] for a wrong password.
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let hash = state
        .store
        .current()
        .and_then(|snapshot| snapshot.config().web_password_hash().map(str::to_string));

    let verified = tokio::task::spawn_blocking(move || check_password(&form.password, hash.as_deref()))
        .await
        .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))?;

    if let Err(e) = verified {
        warn!("Failed login attempt");
        tokio::time::sleep(state.config.login_failure_delay()).await;
        return Err(e.into());
    }

    let token = state.sessions.create()?;
    let cookie = session_cookie(&state.config.cookie_name, token.as_str())?;
    info!("Login succeeded");

    Ok(([cookie], Redirect::to("/settings")).into_response())
}

/// `POST /logout`: end the session and clear the cookie.
///
/// # Errors
///
/// Returns an error only if the clearing cookie cannot be built.
pub async fn logout(
    State(state): State<Arc<GatewayState>>,
    user: SessionUser,
) -> Result<Response, ApiError> {
    state.sessions.destroy(&user.token);
    let cookie = clear_cookie(&state.config.cookie_name)?;
    Ok(([cookie], Json(json!({ "ok": true }))).into_response())
}
