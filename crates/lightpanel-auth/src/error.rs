//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The OS entropy source failed; no token was issued.
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    /// The submitted password did not match the stored hash.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session token is missing, unknown or expired.
    #[error("session invalid or expired")]
    SessionInvalid,

    /// Hashing a password failed.
    #[error("password hash error: {0}")]
    Hash(String),
}

impl AuthError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::SessionInvalid => 401,
            Self::TokenGeneration(_) | Self::Hash(_) => 500,
        }
    }
}
