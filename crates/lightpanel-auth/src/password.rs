//! bcrypt password verification.

use tracing::debug;

use crate::error::{AuthError, Result};

pub use bcrypt::DEFAULT_COST;

/// Check `password` against a stored bcrypt hash.
///
/// An empty or malformed hash never verifies.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    match bcrypt::verify(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            debug!(error = %e, "Stored password hash is not usable");
            false
        }
    }
}

/// Like [`verify_password`], for an optional stored hash.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] unless the password matches.
pub fn check_password(password: &str, hash: Option<&str>) -> Result<()> {
    if verify_password(password, hash.unwrap_or_default()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Produce a bcrypt hash suitable for `web_password_hash`.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if `cost` is out of range or hashing fails.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hash(e.to_string()))
}
