//! API error types and responses.
//!
//! JSON endpoints answer errors with `{"error": {"code", "message"}}`. Two
//! variants render differently: `Unauthorized` redirects to the login page and
//! `InvalidPassword` re-renders it with a message.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use lightpanel_auth::AuthError;
use lightpanel_control::ControlError;
use lightpanel_store::StoreError;

use crate::pages;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, unknown or expired session.
    #[error("unauthorized")]
    Unauthorized,

    /// Wrong password on the login form.
    #[error("incorrect password")]
    InvalidPassword,

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::SEE_OTHER,
            Self::InvalidPassword => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidPassword => "invalid_password",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => Redirect::to("/").into_response(),
            Self::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                Html(pages::login(Some("Incorrect password."))),
            )
                .into_response(),
            Self::BadRequest(_) | Self::Internal(_) => {
                let status = self.status_code();
                let code = self.code();
                let message = self.to_string();

                let body = ErrorResponse {
                    error: ErrorBody { code, message },
                };

                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidPassword,
            AuthError::SessionInvalid => Self::Unauthorized,
            AuthError::TokenGeneration(_) | AuthError::Hash(_) => {
                tracing::error!(error = %err, "Auth internal error");
                Self::Internal("authentication service error".to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => Self::BadRequest(e.to_string()),
            other => {
                tracing::error!(error = %other, "Store error");
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Store(store_err) => {
                tracing::error!(error = %store_err, "Reload failed");
                Self::Internal(format!("reload failed: {store_err}"))
            }
            ControlError::Remote(e) => Self::Internal(e.to_string()),
            ControlError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Self::Internal(msg)
            }
        }
    }
}
