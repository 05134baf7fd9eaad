//! Error types for reload and reconciliation.

use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Failures talking to the remote light service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No response: refused, unreachable or timed out.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote answered with an error status.
    #[error("remote returned HTTP {0}")]
    Status(u16),

    /// The response did not contain a usable `state`.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No remote URL/token is configured.
    #[error("remote service not configured")]
    NotConfigured,
}

impl RemoteError {
    /// Returns `true` for failures that should leave displayed state alone.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::NotConfigured)
    }
}

/// Errors from the control layer.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] lightpanel_store::StoreError),

    /// Remote light service error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Remote(_) => 502,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }
}
