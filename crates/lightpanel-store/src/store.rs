//! The configuration store and its published snapshots.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use lightpanel_core::Configuration;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::file;

/// An immutable, versioned view of the configuration.
///
/// Readers hold an `Arc<ConfigSnapshot>` for as long as they need it; a
/// reload publishes a new snapshot and never mutates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    generation: u64,
    config: Configuration,
}

impl ConfigSnapshot {
    /// Wrap a configuration with its generation number.
    #[must_use]
    pub const fn new(generation: u64, config: Configuration) -> Self {
        Self { generation, config }
    }

    /// Monotonic generation, starting at 1 for the first successful load.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The configuration published in this generation.
    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.config
    }
}

/// Owner of the canonical configuration.
///
/// `current` is lock-free for readers. `reload` and `save` are serialized
/// against each other so generations are assigned in publish order.
#[derive(Debug, Default)]
pub struct ConfigStore {
    path: OnceLock<PathBuf>,
    current: ArcSwapOption<ConfigSnapshot>,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Create a store with no path and no configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already bound to `path`.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let store = Self::new();
        let _ = store.path.set(path.into());
        store
    }

    /// Configure the file path. Setting the same path again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathAlreadySet`] if a different path is already
    /// configured.
    pub fn set_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        match self.path.set(path) {
            Ok(()) => Ok(()),
            Err(rejected) => {
                let current = self.path.get().cloned().unwrap_or_default();
                if current == rejected {
                    Ok(())
                } else {
                    Err(StoreError::PathAlreadySet { current })
                }
            }
        }
    }

    /// The configured file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.get().map(PathBuf::as_path)
    }

    /// The last successfully published snapshot, `None` before the first
    /// load.
    #[must_use]
    pub fn current(&self) -> Option<Arc<ConfigSnapshot>> {
        self.current.load_full()
    }

    /// Re-read the file and publish it as a new generation.
    ///
    /// On failure nothing is published and `current` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathNotSet`] if no path is configured, or the
    /// load error.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock();
        let path = self.path().ok_or(StoreError::PathNotSet)?;
        self.publish_from(path)
    }

    /// Persist `config` and publish it as a new generation in one step.
    ///
    /// No other save or reload can run between the write and the publish,
    /// so the returned snapshot is the one loaded from this write. If the
    /// write fails nothing is published.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathNotSet`] if no path is configured, the write
    /// error, or the load error.
    pub fn save_and_reload(&self, config: &Configuration) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock();
        let path = self.path().ok_or(StoreError::PathNotSet)?;
        file::save(path, config)?;
        self.publish_from(path)
    }

    /// Load `path` and publish it. Caller holds `write_lock`.
    fn publish_from(&self, path: &Path) -> Result<Arc<ConfigSnapshot>> {
        let config = match file::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Reload failed; keeping current configuration");
                return Err(e);
            }
        };

        let generation = self
            .current
            .load()
            .as_ref()
            .map_or(1, |snapshot| snapshot.generation + 1);
        let snapshot = Arc::new(ConfigSnapshot::new(generation, config));
        self.current.store(Some(Arc::clone(&snapshot)));

        info!(
            path = %path.display(),
            generation,
            lights = snapshot.config().lights().len(),
            "Published configuration"
        );
        Ok(snapshot)
    }

    /// Persist `config` to the configured path without publishing it.
    ///
    /// Call [`ConfigStore::reload`] afterwards to make it current.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathNotSet`] if no path is configured, or the
    /// write error.
    pub fn save(&self, config: &Configuration) -> Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.path().ok_or(StoreError::PathNotSet)?;
        file::save(path, config)
    }
}
