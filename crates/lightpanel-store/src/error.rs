//! Error types for the configuration store.

use std::path::PathBuf;

use lightpanel_core::ValidationError;
use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while loading, saving or publishing configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configuration file could not be read or written.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document parsed but failed validation, or did not parse at all.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Serializing the configuration failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// `reload` or `save` was called before a path was configured.
    #[error("configuration path not set")]
    PathNotSet,

    /// `set_path` was called again with a different path.
    #[error("configuration path already set to {}", current.display())]
    PathAlreadySet {
        /// The path configured first.
        current: PathBuf,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by document content rather than the
    /// filesystem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
