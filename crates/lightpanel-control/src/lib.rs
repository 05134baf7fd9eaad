//! Hot reload and light state reconciliation for lightpanel.
//!
//! This crate keeps the panel's per-light state consistent with an
//! unreliable remote light service while configuration changes underneath
//! it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ save + reload
//!                              ▼
//! ┌──────────────────────┐  ReloadEvent  ┌──────────────────────┐
//! │ HotReloadCoordinator │──────────────▶│        Panel         │
//! │  (ConfigStore)       │               │ ReconciliationEngine │
//! └──────────────────────┘               │ LightView            │
//!                                        └──────────┬───────────┘
//!                                                   │ poll worker / toggles
//!                                                   ▼
//!                                        ┌──────────────────────┐
//!                                        │ LightApi (HTTP)      │
//!                                        └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use lightpanel_control::{HotReloadCoordinator, HttpConnector, LoggingView, Panel, PanelConfig};
//! use lightpanel_store::ConfigStore;
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(ConfigStore::with_path("/etc/ha_lights.conf"));
//! let (coordinator, reloads) = HotReloadCoordinator::new(Arc::clone(&store));
//! let initial = coordinator.reload()?;
//!
//! let config = PanelConfig::default();
//! let (panel, _taps) = Panel::new(
//!     initial,
//!     LoggingView::new(),
//!     reloads,
//!     Arc::new(HttpConnector::new(config.remote)),
//!     config,
//! );
//!
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//! panel.run(shutdown_rx).await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod error;
pub mod panel;
pub mod reload;
pub mod remote;
pub mod view;

pub use engine::{toggle, PollOutcome, ReconciliationEngine, RuntimeLightState, TapEvent, ToggleRequest};
pub use error::{ControlError, RemoteError, Result};
pub use panel::{Panel, PanelConfig, PanelHandle, PollRequest, PollResult};
pub use reload::{HotReloadCoordinator, ReloadEvent};
pub use remote::{
    ConnectionCheck, Connector, HttpConnector, HttpLightApi, LightApi, RemoteConfig, RemoteResult,
};
pub use view::{LightView, LoggingView};

#[cfg(any(test, feature = "test-utils"))]
pub use remote::{MockConnector, MockLightApi};
#[cfg(any(test, feature = "test-utils"))]
pub use view::{RecordingView, ViewEvent};
