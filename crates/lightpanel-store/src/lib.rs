//! Configuration store for lightpanel.
//!
//! This crate owns the canonical [`Configuration`](lightpanel_core::Configuration):
//! it loads and validates the JSON document on disk, writes it back
//! atomically, and publishes each successful load as an immutable
//! [`ConfigSnapshot`].
//!
//! # Architecture
//!
//! ```text
//!   save(config) ──► temp file ──► rename ──► lights.conf
//!                                                 │
//!   reload() ◄──────────── load + validate ◄──────┘
//!      │
//!      └──► ArcSwapOption<ConfigSnapshot>  (generation + 1)
//!                 │
//!                 └──► current()  (lock-free readers)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use lightpanel_store::ConfigStore;
//!
//! let store = ConfigStore::with_path("/etc/ha_lights.conf");
//! let snapshot = store.reload().unwrap();
//! println!("generation {} has {} lights", snapshot.generation(), snapshot.config().lights().len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod file;
pub mod store;

pub use error::{Result, StoreError};
pub use file::{load, parse, save};
pub use store::{ConfigSnapshot, ConfigStore};
