//! Web settings server for lightpanel.
//!
//! This crate serves the password-protected settings pages and the JSON API
//! behind them. It handles:
//!
//! - Password login with bounded, idle-expiring sessions
//! - Reading and writing the light configuration
//! - Publishing saved configuration to the running panel
//! - Probing a remote light service before saving it
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Browser                              │
//! │               (login form / settings page)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   lightpanel-gateway                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │ SessionUser │ │   Router    │ │   Pages             │   │
//! │  │  Extractor  │ │  + Handlers │ │   (HTML)            │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │ Sessions │   │  Store + │   │  Remote  │
//!        │ (auth)   │   │  Reload  │   │  check   │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lightpanel_auth::{SessionConfig, SessionManager};
//! use lightpanel_control::{HotReloadCoordinator, RemoteConfig};
//! use lightpanel_gateway::{create_router, GatewayConfig, GatewayState};
//! use lightpanel_store::ConfigStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(ConfigStore::with_path("/etc/ha_lights.conf"));
//! let (reloader, _reloads) = HotReloadCoordinator::new(store);
//! reloader.reload()?;
//!
//! let sessions = Arc::new(SessionManager::new(&SessionConfig::default()));
//! let state = GatewayState::new(
//!     reloader,
//!     sessions,
//!     RemoteConfig::default(),
//!     GatewayConfig::default(),
//! );
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;

// Re-export key types for convenience
pub use auth::SessionUser;
