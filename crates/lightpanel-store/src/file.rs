//! Reading and writing configuration documents.
//!
//! The on-disk format is pretty-printed JSON. Key order is fixed by
//! [`ConfigDocument`]'s field order and absent optional fields are omitted, so
//! saving the same configuration twice produces identical bytes.

use std::io::Write;
use std::path::Path;

use lightpanel_core::{ConfigDocument, Configuration, ValidationError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Parse and validate a configuration document.
///
/// # Errors
///
/// Returns [`ValidationError::Malformed`] for invalid JSON (an empty string
/// included) and the specific validation error for bad light entries.
pub fn parse(text: &str) -> lightpanel_core::Result<Configuration> {
    let doc: ConfigDocument =
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    Configuration::try_from(doc)
}

/// Load and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read and
/// [`StoreError::Validation`] if its content is rejected.
pub fn load(path: &Path) -> Result<Configuration> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let config = parse(&text)?;
    debug!(path = %path.display(), lights = config.lights().len(), "Loaded configuration");
    Ok(config)
}

/// Serialize a configuration to its canonical document text.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if JSON encoding fails.
pub fn to_text(config: &Configuration) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&config.to_document())
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

/// Write `config` to `path` atomically.
///
/// The document is written to a temporary file in the destination directory,
/// flushed, and renamed over `path`. On any failure the previous file is left
/// in place.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if any filesystem step fails.
pub fn save(path: &Path, config: &Configuration) -> Result<()> {
    let text = to_text(config)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    debug!(path = %path.display(), lights = config.lights().len(), "Saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightpanel_core::LightEntry;

    fn sample() -> Configuration {
        Configuration::try_from(ConfigDocument {
            remote_url: Some("http://ha.local:8123".into()),
            remote_token: Some("abc".into()),
            web_password_hash: Some("$2b$04$abcdefghijklmnopqrstuu".into()),
            lights: vec![
                LightEntry::new("light.porch", "Porch", "bulb"),
                LightEntry::new("switch.fan", "Fan", "fan"),
                LightEntry::new("light.attic", "Attic", "lamp"),
            ],
        })
        .unwrap()
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lights.conf");

        let config = sample();
        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn roundtrip_without_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lights.conf");

        let config = parse(r#"{"lights":[{"entity_id":"light.a","label":"A","icon":"bulb"}]}"#)
            .unwrap();
        save(&path, &config).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("remote_url"));
        assert!(!text.contains("web_password_hash"));
        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn saved_text_is_deterministic() {
        let config = sample();
        let text = to_text(&config).unwrap();
        assert_eq!(text, to_text(&config).unwrap());

        let url = text.find("remote_url").unwrap();
        let token = text.find("remote_token").unwrap();
        let hash = text.find("web_password_hash").unwrap();
        let lights = text.find("lights").unwrap();
        assert!(url < token && token < hash && hash < lights);

        let porch = text.find("light.porch").unwrap();
        let attic = text.find("light.attic").unwrap();
        assert!(porch < attic);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lights.conf");
        save(&path, &sample()).unwrap();
        save(&path, &sample()).unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn save_into_missing_directory_fails_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("lights.conf");
        let err = save(&path, &sample()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.conf")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn empty_and_garbage_are_malformed() {
        for text in ["", "{", "null", "{\"lights\": 3}"] {
            assert!(
                matches!(parse(text), Err(ValidationError::Malformed(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn too_many_lights_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lights.conf");

        let entries: Vec<String> = (0..17)
            .map(|i| format!(r#"{{"entity_id":"light.l{i}","label":"L{i}","icon":"bulb"}}"#))
            .collect();
        std::fs::write(&path, format!(r#"{{"lights":[{}]}}"#, entries.join(","))).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::TooManyLights { count: 17, .. })
        ));
    }

    #[test]
    fn invalid_entry_fails_whole_load() {
        let text = r#"{"lights":[
            {"entity_id":"light.ok","label":"Ok"},
            {"entity_id":"light.","label":"Broken"}
        ]}"#;
        assert!(matches!(
            parse(text),
            Err(ValidationError::InvalidEntityId { index: 1, .. })
        ));
    }

    #[test]
    fn credentials_are_optional() {
        let config = parse("{}").unwrap();
        assert!(config.remote_url().is_none());
        assert!(config.web_password_hash().is_none());
        assert!(config.lights().is_empty());
    }
}
