//! Per-light state reconciliation.
//!
//! Each light has a `confirmed` state (last successful remote read) and an
//! `optimistic` state (what the user sees). Two producers drive them:
//!
//! | Input                    | confirmed | optimistic        | render |
//! |--------------------------|-----------|-------------------|--------|
//! | poll: `State(s)`         | `s`       | `s`               | yes    |
//! | poll: `Status` / `Malformed` | Unknown | Unknown         | yes    |
//! | poll: `Connection`       | unchanged | unchanged         | no     |
//! | tap reporting `prev`     | unchanged | `prev.toggled()`  | yes    |
//!
//! A failed toggle is never compensated directly; the next poll corrects
//! both states.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lightpanel_core::{EntityId, LightState};
use lightpanel_store::ConfigSnapshot;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::remote::{LightApi, RemoteResult};
use crate::view::LightView;

/// Runtime state of one light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeLightState {
    /// Last state read from the remote.
    pub confirmed: LightState,
    /// State shown to the user.
    pub optimistic: LightState,
    /// When a poll outcome or a tap was last applied.
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// What one poll of one light produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The remote reported a state.
    State(LightState),
    /// No response.
    Connection,
    /// The remote answered with an error status.
    Status(u16),
    /// The response had no usable state.
    Malformed,
}

impl From<RemoteResult<LightState>> for PollOutcome {
    fn from(result: RemoteResult<LightState>) -> Self {
        match result {
            Ok(state) => Self::State(state),
            Err(RemoteError::Connection(_) | RemoteError::NotConfigured) => Self::Connection,
            Err(RemoteError::Status(code)) => Self::Status(code),
            Err(RemoteError::Malformed(_)) => Self::Malformed,
        }
    }
}

/// A tap from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapEvent {
    /// The tapped light.
    pub entity_id: EntityId,
    /// The state the tile showed when tapped.
    pub previous: LightState,
}

/// A remote toggle to perform after a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleRequest {
    /// Generation the tap was applied against.
    pub generation: u64,
    /// Light to toggle.
    pub entity_id: EntityId,
}

/// Owner of the runtime state array and the view.
#[derive(Debug)]
pub struct ReconciliationEngine<V> {
    snapshot: Option<Arc<ConfigSnapshot>>,
    states: Vec<RuntimeLightState>,
    view: V,
}

impl<V: LightView> ReconciliationEngine<V> {
    /// Create an engine with no lights.
    pub fn new(view: V) -> Self {
        Self {
            snapshot: None,
            states: Vec::new(),
            view,
        }
    }

    /// Replace the light list with the one in `snapshot`.
    ///
    /// Every light restarts as Unknown/Unknown and the view is rebuilt.
    /// Snapshots older than or equal to the current generation are ignored;
    /// returns whether a rebuild happened.
    pub fn rebuild(&mut self, snapshot: Arc<ConfigSnapshot>) -> bool {
        if snapshot.generation() <= self.generation() {
            debug!(
                generation = snapshot.generation(),
                current = self.generation(),
                "Ignoring stale snapshot"
            );
            return false;
        }

        let lights = snapshot.config().lights();
        self.states = vec![RuntimeLightState::default(); lights.len()];
        self.view.rebuild(lights);
        debug!(generation = snapshot.generation(), lights = lights.len(), "Engine rebuilt");
        self.snapshot = Some(snapshot);
        true
    }

    /// Generation the state array belongs to, 0 before the first rebuild.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot.as_ref().map_or(0, |s| s.generation())
    }

    /// The snapshot the state array belongs to.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<ConfigSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Runtime state for every light, in display order.
    #[must_use]
    pub fn states(&self) -> &[RuntimeLightState] {
        &self.states
    }

    /// Runtime state of one light.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<&RuntimeLightState> {
        self.states.get(index)
    }

    /// The view being driven.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Apply one poll result. Returns whether anything changed.
    ///
    /// Results for another generation or an index outside the current list
    /// are dropped.
    pub fn apply_poll(&mut self, generation: u64, index: usize, outcome: PollOutcome) -> bool {
        if generation != self.generation() {
            debug!(generation, current = self.generation(), index, "Dropping stale poll result");
            return false;
        }
        let Some(light) = self.states.get_mut(index) else {
            return false;
        };

        let state = match outcome {
            PollOutcome::Connection => return false,
            PollOutcome::Status(_) | PollOutcome::Malformed => LightState::Unknown,
            PollOutcome::State(state) => state,
        };

        light.confirmed = state;
        light.optimistic = state;
        light.last_updated_at = Some(Utc::now());
        self.view.set_light_state(index, state);
        true
    }

    /// Apply a tap: flip the optimistic state and render it at once.
    ///
    /// Returns the remote toggle to perform, or `None` if the entity is not in
    /// the current list.
    pub fn apply_tap(&mut self, tap: TapEvent) -> Option<ToggleRequest> {
        let snapshot = self.snapshot.as_ref()?;
        let Some(index) = snapshot.config().position_of(tap.entity_id.as_str()) else {
            debug!(entity_id = %tap.entity_id, "Tap for unknown light");
            return None;
        };
        let generation = snapshot.generation();

        let target = tap.previous.toggled();
        let light = &mut self.states[index];
        light.optimistic = target;
        light.last_updated_at = Some(Utc::now());
        self.view.set_light_state(index, target);

        Some(ToggleRequest {
            generation,
            entity_id: tap.entity_id,
        })
    }
}

/// Toggle a light based on a fresh read of its remote state.
///
/// If the remote reports On the light is turned off; otherwise, including
/// when the read fails, it is turned on. The state may change between the
/// read and the call; the next poll corrects whatever happens.
///
/// # Errors
///
/// Returns the error from the `turn_on` / `turn_off` call.
pub async fn toggle(api: &dyn LightApi, entity_id: &EntityId) -> RemoteResult<()> {
    let currently_on = match api.fetch_state(entity_id).await {
        Ok(state) => state == LightState::On,
        Err(e) => {
            debug!(entity_id = %entity_id, error = %e, "Fresh read before toggle failed");
            false
        }
    };

    let result = api.set_state(entity_id, !currently_on).await;
    if let Err(ref e) = result {
        warn!(entity_id = %entity_id, error = %e, "Toggle failed; next poll will correct");
    }
    result
}
