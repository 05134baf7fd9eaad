//! Configuration model.
//!
//! [`ConfigDocument`] is the raw serde shape shared by the config file and
//! the web API. [`Configuration`] is the validated form; the only way to get
//! one is through [`TryFrom<ConfigDocument>`], so every `Configuration` value
//! satisfies the light-list invariants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;
use crate::error::{Result, ValidationError};
use crate::light::{validate_label, LightSpec, DEFAULT_ICON};

/// Maximum number of lights in one configuration.
pub const MAX_LIGHTS: usize = 16;

/// Raw configuration document, before validation.
///
/// Field order here is the order written to disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Base URL of the remote service.
    #[serde(default, alias = "ha_url", skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Bearer token for the remote service.
    #[serde(default, alias = "ha_token", skip_serializing_if = "Option::is_none")]
    pub remote_token: Option<String>,

    /// bcrypt hash of the web settings password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_password_hash: Option<String>,

    /// Ordered light entries.
    #[serde(default)]
    pub lights: Vec<LightEntry>,
}

/// One light entry as it appears in a document.
///
/// Missing `entity_id` / `label` deserialize as empty strings so that
/// validation can report which light is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightEntry {
    /// Remote entity id, `<domain>.<name>`.
    #[serde(default)]
    pub entity_id: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Icon token.
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl LightEntry {
    /// Convenience constructor.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            label: label.into(),
            icon: icon.into(),
        }
    }

    fn validate(self, index: usize) -> Result<LightSpec> {
        let entity_id = EntityId::parse(&self.entity_id).map_err(|e| e.at(index))?;
        if !validate_label(&self.label) {
            return Err(ValidationError::InvalidLabel {
                index,
                value: self.label,
            });
        }
        Ok(LightSpec::from_validated(entity_id, self.label, self.icon))
    }
}

impl From<&LightSpec> for LightEntry {
    fn from(spec: &LightSpec) -> Self {
        Self {
            entity_id: spec.entity_id().to_string(),
            label: spec.label().to_string(),
            icon: spec.icon().to_string(),
        }
    }
}

impl fmt::Debug for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDocument")
            .field("remote_url", &self.remote_url)
            .field("remote_token", &self.remote_token.as_ref().map(|_| "<redacted>"))
            .field(
                "web_password_hash",
                &self.web_password_hash.as_ref().map(|_| "<redacted>"),
            )
            .field("lights", &self.lights)
            .finish()
    }
}

/// A validated configuration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    remote_url: Option<String>,
    remote_token: Option<String>,
    web_password_hash: Option<String>,
    lights: Vec<LightSpec>,
}

impl Configuration {
    /// Remote base URL, if set.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Remote bearer token, if set.
    #[must_use]
    pub fn remote_token(&self) -> Option<&str> {
        self.remote_token.as_deref()
    }

    /// Stored password hash, if set.
    #[must_use]
    pub fn web_password_hash(&self) -> Option<&str> {
        self.web_password_hash.as_deref()
    }

    /// Lights in display order.
    #[must_use]
    pub fn lights(&self) -> &[LightSpec] {
        &self.lights
    }

    /// Connection settings, when both URL and token are non-empty.
    #[must_use]
    pub fn remote(&self) -> Option<RemoteSettings> {
        match (self.remote_url(), self.remote_token()) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some(RemoteSettings::new(url, token))
            }
            _ => None,
        }
    }

    /// Position of the light with the given entity id.
    #[must_use]
    pub fn position_of(&self, entity_id: &str) -> Option<usize> {
        self.lights
            .iter()
            .position(|l| l.entity_id().as_str() == entity_id)
    }

    /// Convert back into the raw document form.
    #[must_use]
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            remote_url: self.remote_url.clone(),
            remote_token: self.remote_token.clone(),
            web_password_hash: self.web_password_hash.clone(),
            lights: self.lights.iter().map(LightEntry::from).collect(),
        }
    }
}

impl TryFrom<ConfigDocument> for Configuration {
    type Error = ValidationError;

    fn try_from(doc: ConfigDocument) -> Result<Self> {
        if doc.lights.len() > MAX_LIGHTS {
            return Err(ValidationError::TooManyLights {
                count: doc.lights.len(),
                max: MAX_LIGHTS,
            });
        }

        let lights = doc
            .lights
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.validate(index))
            .collect::<Result<Vec<LightSpec>>>()?;

        for (index, light) in lights.iter().enumerate() {
            if lights[..index]
                .iter()
                .any(|earlier| earlier.entity_id() == light.entity_id())
            {
                return Err(ValidationError::DuplicateEntityId {
                    index,
                    value: light.entity_id().to_string(),
                });
            }
        }

        Ok(Self {
            remote_url: doc.remote_url,
            remote_token: doc.remote_token,
            web_password_hash: doc.web_password_hash,
            lights,
        })
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("remote_url", &self.remote_url)
            .field("remote_token", &self.remote_token.as_ref().map(|_| "<redacted>"))
            .field(
                "web_password_hash",
                &self.web_password_hash.as_ref().map(|_| "<redacted>"),
            )
            .field("lights", &self.lights)
            .finish()
    }
}

/// Connection settings for the remote light service.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    base_url: String,
    token: String,
}

impl RemoteSettings {
    /// Create settings; a trailing `/` on the base URL is dropped.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
        }
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lights(n: usize) -> Vec<LightEntry> {
        (0..n)
            .map(|i| LightEntry::new(format!("light.l{i}"), format!("Light {i}"), "bulb"))
            .collect()
    }

    #[test]
    fn sixteen_lights_ok_seventeen_rejected() {
        let doc = ConfigDocument {
            lights: lights(16),
            ..Default::default()
        };
        assert_eq!(Configuration::try_from(doc).unwrap().lights().len(), 16);

        let doc = ConfigDocument {
            lights: lights(17),
            ..Default::default()
        };
        assert_eq!(
            Configuration::try_from(doc),
            Err(ValidationError::TooManyLights { count: 17, max: 16 })
        );
    }

    #[test]
    fn one_bad_light_rejects_everything() {
        let mut entries = lights(3);
        entries[1].entity_id = "light.kit-chen".into();
        let doc = ConfigDocument {
            lights: entries,
            ..Default::default()
        };
        assert!(matches!(
            Configuration::try_from(doc),
            Err(ValidationError::InvalidEntityId { index: 1, .. })
        ));
    }

    #[test]
    fn duplicate_entity_ids_rejected() {
        let doc = ConfigDocument {
            lights: vec![
                LightEntry::new("light.a", "A", "bulb"),
                LightEntry::new("light.b", "B", "bulb"),
                LightEntry::new("light.a", "A again", "lamp"),
            ],
            ..Default::default()
        };
        assert_eq!(
            Configuration::try_from(doc),
            Err(ValidationError::DuplicateEntityId {
                index: 2,
                value: "light.a".into()
            })
        );
    }

    #[test]
    fn bad_label_is_reported() {
        let doc = ConfigDocument {
            lights: vec![LightEntry::new("light.a", "x".repeat(32), "bulb")],
            ..Default::default()
        };
        assert!(matches!(
            Configuration::try_from(doc),
            Err(ValidationError::InvalidLabel { index: 0, .. })
        ));
    }

    #[test]
    fn document_keeps_order() {
        let doc = ConfigDocument {
            remote_url: Some("http://ha.local:8123".into()),
            remote_token: Some("tok".into()),
            web_password_hash: Some("$2b$04$hash".into()),
            lights: vec![
                LightEntry::new("light.zeta", "Zeta", "bulb"),
                LightEntry::new("light.alpha", "Alpha", "lamp"),
            ],
        };
        let config = Configuration::try_from(doc.clone()).unwrap();
        assert_eq!(config.lights()[0].entity_id().as_str(), "light.zeta");
        assert_eq!(config.to_document(), doc);
    }

    #[test]
    fn legacy_keys_and_default_icon() {
        let json = r#"{"ha_url":"http://h","ha_token":"t","lights":[{"entity_id":"light.a","label":"A"}]}"#;
        let doc: ConfigDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.remote_url.as_deref(), Some("http://h"));
        assert_eq!(doc.remote_token.as_deref(), Some("t"));
        assert_eq!(doc.lights[0].icon, DEFAULT_ICON);
    }

    #[test]
    fn remote_requires_both_parts() {
        let mut doc = ConfigDocument {
            remote_url: Some("http://ha.local:8123/".into()),
            ..Default::default()
        };
        assert!(Configuration::try_from(doc.clone()).unwrap().remote().is_none());

        doc.remote_token = Some(String::new());
        assert!(Configuration::try_from(doc.clone()).unwrap().remote().is_none());

        doc.remote_token = Some("tok".into());
        let remote = Configuration::try_from(doc).unwrap().remote().unwrap();
        assert_eq!(remote.base_url(), "http://ha.local:8123");
        assert_eq!(remote.token(), "tok");
    }

    #[test]
    fn debug_redacts_secrets() {
        let doc = ConfigDocument {
            remote_token: Some("secret-token".into()),
            web_password_hash: Some("$2b$hash".into()),
            ..Default::default()
        };
        let config = Configuration::try_from(doc).unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("secret-token"));
        assert!(!shown.contains("$2b$hash"));
    }

    #[test]
    fn position_of_finds_light() {
        let doc = ConfigDocument {
            lights: lights(3),
            ..Default::default()
        };
        let config = Configuration::try_from(doc).unwrap();
        assert_eq!(config.position_of("light.l2"), Some(2));
        assert_eq!(config.position_of("light.nope"), None);
    }
}
