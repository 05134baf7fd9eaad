//! Core types and validation for lightpanel.
//!
//! This crate provides the domain types shared by every other crate in the
//! workspace:
//!
//! - **Entities**: [`EntityId`] with the `<domain>.<name>` format check
//! - **Lights**: [`LightSpec`] (static definition) and [`LightState`]
//! - **Configuration**: the validated [`Configuration`] and its raw
//!   on-disk/wire form [`ConfigDocument`]
//! - **Errors**: [`ValidationError`]
//!
//! # Example
//!
//! ```
//! use lightpanel_core::{Configuration, ConfigDocument, EntityId, LightState};
//!
//! let id = EntityId::parse("light.kitchen").unwrap();
//! assert_eq!(id.domain(), "light");
//!
//! let doc = ConfigDocument::default();
//! let config = Configuration::try_from(doc).unwrap();
//! assert!(config.lights().is_empty());
//!
//! assert_eq!(LightState::Unknown.toggled(), LightState::On);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod entity;
pub mod error;
pub mod light;

pub use config::{ConfigDocument, Configuration, LightEntry, RemoteSettings, MAX_LIGHTS};
pub use entity::EntityId;
pub use error::{Result, ValidationError};
pub use light::{validate_label, LightSpec, LightState, DEFAULT_ICON, MAX_LABEL_CHARS};
