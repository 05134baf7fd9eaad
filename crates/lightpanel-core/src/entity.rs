//! Remote entity identifiers.
//!
//! An entity id names one switchable thing on the remote service, e.g.
//! `light.living_room` or `switch.studio_lamp`. The part before the dot is the
//! service domain used when calling `turn_on` / `turn_off`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidEntityId;

/// A validated `<domain>.<name>` entity identifier.
///
/// Both parts are non-empty and contain only ASCII alphanumerics and `_`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    raw: String,
    dot: usize,
}

impl EntityId {
    /// Parse and validate an entity id.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `<domain>.<name>` with both parts
    /// drawn from `[A-Za-z0-9_]`.
    pub fn parse(s: &str) -> Result<Self, InvalidEntityId> {
        let invalid = || InvalidEntityId(s.to_string());

        let (domain, name) = s.split_once('.').ok_or_else(invalid)?;
        if !is_segment(domain) || !is_segment(name) {
            return Err(invalid());
        }

        Ok(Self {
            raw: s.to_string(),
            dot: domain.len(),
        })
    }

    /// The service domain, e.g. `light`.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.raw[..self.dot]
    }

    /// The object name, e.g. `kitchen`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw[self.dot + 1..]
    }

    /// The full id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = InvalidEntityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.raw
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_domain_and_name() {
        let id = EntityId::parse("light.kitchen").unwrap();
        assert_eq!(id.domain(), "light");
        assert_eq!(id.name(), "kitchen");
        assert_eq!(id.to_string(), "light.kitchen");
    }

    #[test]
    fn accepts_underscores_and_digits() {
        let id = EntityId::parse("switch.studio_lamp_2").unwrap();
        assert_eq!(id.domain(), "switch");
        assert_eq!(id.name(), "studio_lamp_2");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "light", ".kitchen", "light.", "light.kit-chen", "a.b.c", "li ght.x"] {
            assert!(EntityId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(EntityId::parse("light.küche").is_err());
    }

    #[test]
    fn serde_json_roundtrip() {
        let id = EntityId::parse("light.porch").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"light.porch\"");
        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<EntityId, _> = serde_json::from_str("\"nodot\"");
        assert!(result.is_err());
    }
}
