//! Light definitions and runtime states.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;

/// Maximum label length, counted in characters.
pub const MAX_LABEL_CHARS: usize = 31;

/// Icon used when a document entry does not name one.
pub const DEFAULT_ICON: &str = "bulb";

/// Returns `true` if `label` is between 1 and [`MAX_LABEL_CHARS`] characters.
#[must_use]
pub fn validate_label(label: &str) -> bool {
    let len = label.chars().count();
    (1..=MAX_LABEL_CHARS).contains(&len)
}

/// Static definition of one light tile.
///
/// Immutable once part of a configuration snapshot; a reload replaces the
/// whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightSpec {
    entity_id: EntityId,
    label: String,
    icon: String,
}

impl LightSpec {
    /// Build a light definition from already-validated parts.
    ///
    /// Returns `None` if the label is out of range.
    #[must_use]
    pub fn new(entity_id: EntityId, label: impl Into<String>, icon: impl Into<String>) -> Option<Self> {
        let label = label.into();
        if !validate_label(&label) {
            return None;
        }
        Some(Self {
            entity_id,
            label,
            icon: icon.into(),
        })
    }

    pub(crate) fn from_validated(entity_id: EntityId, label: String, icon: String) -> Self {
        Self {
            entity_id,
            label,
            icon,
        }
    }

    /// The remote entity this tile controls.
    #[must_use]
    pub const fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Icon token.
    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }
}

/// State of a light as known to the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    /// The light is on.
    On,
    /// The light is off.
    Off,
    /// The state could not be determined.
    #[default]
    Unknown,
}

impl LightState {
    /// Map a remote `state` string. Only `"on"` and `"off"` are definite.
    #[must_use]
    pub fn from_remote(s: &str) -> Self {
        match s {
            "on" => Self::On,
            "off" => Self::Off,
            _ => Self::Unknown,
        }
    }

    /// The state a tap moves to: On becomes Off, everything else becomes On.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off | Self::Unknown => Self::On,
        }
    }

    /// Lowercase name, as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_bounds() {
        assert!(validate_label("a"));
        assert!(validate_label(&"x".repeat(31)));
        assert!(!validate_label(""));
        assert!(!validate_label(&"x".repeat(32)));
    }

    #[test]
    fn label_counts_characters() {
        // 31 two-byte characters is still 31 characters.
        assert!(validate_label(&"é".repeat(31)));
    }

    #[test]
    fn light_spec_rejects_bad_label() {
        let id = EntityId::parse("light.kitchen").unwrap();
        assert!(LightSpec::new(id.clone(), "", "bulb").is_none());
        let spec = LightSpec::new(id, "Kitchen", "bulb").unwrap();
        assert_eq!(spec.label(), "Kitchen");
        assert_eq!(spec.entity_id().as_str(), "light.kitchen");
    }

    #[test]
    fn toggled_states() {
        assert_eq!(LightState::On.toggled(), LightState::Off);
        assert_eq!(LightState::Off.toggled(), LightState::On);
        assert_eq!(LightState::Unknown.toggled(), LightState::On);
    }

    #[test]
    fn from_remote_strings() {
        assert_eq!(LightState::from_remote("on"), LightState::On);
        assert_eq!(LightState::from_remote("off"), LightState::Off);
        assert_eq!(LightState::from_remote("unavailable"), LightState::Unknown);
        assert_eq!(LightState::from_remote("ON"), LightState::Unknown);
    }
}
