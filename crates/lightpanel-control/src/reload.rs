//! Hot reload hand-off.
//!
//! The coordinator runs on whatever task triggered the reload (usually an
//! HTTP handler). It only publishes; rebuilding the engine and the view
//! happens on the panel tick when it drains the [`ReloadEvent`] channel.

use std::sync::Arc;

use lightpanel_core::Configuration;
use lightpanel_store::{ConfigSnapshot, ConfigStore};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;

/// Notice that a new configuration generation is ready.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// The freshly published snapshot.
    pub snapshot: Arc<ConfigSnapshot>,
}

/// Reloads the store and notifies the panel tick.
#[derive(Debug, Clone)]
pub struct HotReloadCoordinator {
    store: Arc<ConfigStore>,
    events: mpsc::UnboundedSender<ReloadEvent>,
}

impl HotReloadCoordinator {
    /// Create a coordinator and the receiver the panel tick should drain.
    #[must_use]
    pub fn new(store: Arc<ConfigStore>) -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { store, events }, rx)
    }

    /// The store being reloaded.
    #[must_use]
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Re-read the configuration file and publish it.
    ///
    /// Performs blocking file I/O. On failure the current snapshot, the view
    /// and the runtime states are untouched.
    ///
    /// # Errors
    ///
    /// Returns the store error if the file cannot be loaded.
    pub fn reload(&self) -> Result<Arc<ConfigSnapshot>> {
        let snapshot = self.store.reload()?;
        info!(generation = snapshot.generation(), "Configuration reloaded");
        self.notify(&snapshot);
        Ok(snapshot)
    }

    /// Write `config` to the store and publish it.
    ///
    /// The write and the reload happen under one store lock, so the returned
    /// snapshot holds exactly `config`. Performs blocking file I/O.
    ///
    /// # Errors
    ///
    /// Returns the store error if the write or the reload fails; nothing is
    /// published in that case.
    pub fn save_and_reload(&self, config: &Configuration) -> Result<Arc<ConfigSnapshot>> {
        let snapshot = self.store.save_and_reload(config)?;
        info!(generation = snapshot.generation(), "Configuration saved and reloaded");
        self.notify(&snapshot);
        Ok(snapshot)
    }

    fn notify(&self, snapshot: &Arc<ConfigSnapshot>) {
        let event = ReloadEvent {
            snapshot: Arc::clone(snapshot),
        };
        if self.events.send(event).is_err() {
            debug!(generation = snapshot.generation(), "Panel is not running; reload not delivered");
        }
    }
}
