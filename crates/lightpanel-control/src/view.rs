//! The presentation seam.
//!
//! The panel tick is the only caller of a [`LightView`]; implementations do
//! not need to be thread-safe beyond being movable onto the tick task.

use lightpanel_core::{LightSpec, LightState};
use tracing::{debug, info};

/// Render interface the reconciliation engine drives.
pub trait LightView: Send {
    /// Discard the current tiles and build one per light, in order.
    fn rebuild(&mut self, lights: &[LightSpec]);

    /// Show `state` on the tile at `index`.
    fn set_light_state(&mut self, index: usize, state: LightState);
}

/// A view that renders to the log.
#[derive(Debug, Default)]
pub struct LoggingView {
    labels: Vec<String>,
}

impl LoggingView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LightView for LoggingView {
    fn rebuild(&mut self, lights: &[LightSpec]) {
        self.labels = lights.iter().map(|l| l.label().to_string()).collect();
        info!(tiles = self.labels.len(), "View rebuilt");
    }

    fn set_light_state(&mut self, index: usize, state: LightState) {
        let label = self.labels.get(index).map_or("?", String::as_str);
        debug!(index, label, state = %state, "Render");
    }
}

/// One call made on a [`RecordingView`].
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// `rebuild` with these entity ids.
    Rebuilt(Vec<String>),
    /// `set_light_state`.
    Set(usize, LightState),
}

/// A view that records every call, readable from another task.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: std::sync::Arc<parking_lot::Mutex<Vec<ViewEvent>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingView {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    /// The most recent state set for `index`, if any.
    #[must_use]
    pub fn last_state(&self, index: usize) -> Option<LightState> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Set(i, state) if *i == index => Some(*state),
            _ => None,
        })
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl LightView for RecordingView {
    fn rebuild(&mut self, lights: &[LightSpec]) {
        let ids = lights.iter().map(|l| l.entity_id().to_string()).collect();
        self.events.lock().push(ViewEvent::Rebuilt(ids));
    }

    fn set_light_state(&mut self, index: usize, state: LightState) {
        self.events.lock().push(ViewEvent::Set(index, state));
    }
}
