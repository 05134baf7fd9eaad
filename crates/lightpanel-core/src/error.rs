//! Validation error types for lightpanel.
//!
//! These errors describe why a configuration document was rejected. They are
//! shared by the store (file loads) and the gateway (web edits).

use thiserror::Error;

/// A result type using `ValidationError`.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reasons a configuration or one of its fields failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An entity id is not of the form `<domain>.<name>`.
    #[error("light {index}: invalid entity_id '{value}' (must be <domain>.<name>)")]
    InvalidEntityId {
        /// Position of the offending light in the list.
        index: usize,
        /// The rejected value.
        value: String,
    },

    /// A label is empty or longer than the maximum.
    #[error("light {index}: invalid label '{value}' (must be 1-31 characters)")]
    InvalidLabel {
        /// Position of the offending light in the list.
        index: usize,
        /// The rejected value.
        value: String,
    },

    /// Two lights name the same entity.
    #[error("light {index}: duplicate entity_id '{value}'")]
    DuplicateEntityId {
        /// Position of the second occurrence.
        index: usize,
        /// The repeated entity id.
        value: String,
    },

    /// The light list exceeds the fixed capacity.
    #[error("too many lights: {count} (max {max})")]
    TooManyLights {
        /// Number of lights in the rejected document.
        count: usize,
        /// The fixed maximum.
        max: usize,
    },

    /// The document is not structurally valid.
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Error returned by [`crate::EntityId::parse`] before a light index is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entity id: '{0}'")]
pub struct InvalidEntityId(pub String);

impl InvalidEntityId {
    /// Attach the light's position to produce a [`ValidationError`].
    #[must_use]
    pub fn at(self, index: usize) -> ValidationError {
        ValidationError::InvalidEntityId {
            index,
            value: self.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_light() {
        let err = ValidationError::InvalidLabel {
            index: 3,
            value: String::new(),
        };
        assert!(err.to_string().starts_with("light 3:"));

        let err = InvalidEntityId("light".into()).at(7);
        assert_eq!(
            err,
            ValidationError::InvalidEntityId {
                index: 7,
                value: "light".into()
            }
        );
    }

    #[test]
    fn too_many_lights_message() {
        let err = ValidationError::TooManyLights { count: 17, max: 16 };
        assert_eq!(err.to_string(), "too many lights: 17 (max 16)");
    }
}
