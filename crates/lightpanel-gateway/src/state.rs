//! Gateway application state.
//!
//! This module defines the shared state that is available to all request
//! handlers.

use std::sync::Arc;

use lightpanel_auth::SessionManager;
use lightpanel_control::{HotReloadCoordinator, RemoteConfig};
use lightpanel_store::ConfigStore;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// Every service a handler needs is reached through this struct; nothing is
/// process-global.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Owner of the canonical configuration.
    pub store: Arc<ConfigStore>,
    /// Authenticated web sessions.
    pub sessions: Arc<SessionManager>,
    /// Publishes saved configuration to the panel.
    pub reloader: HotReloadCoordinator,
    /// Timeouts for the connection test.
    pub remote: RemoteConfig,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl GatewayState {
    /// Create a new gateway state.
    ///
    /// The store is the one the coordinator reloads.
    #[must_use]
    pub fn new(
        reloader: HotReloadCoordinator,
        sessions: Arc<SessionManager>,
        remote: RemoteConfig,
        config: GatewayConfig,
    ) -> Self {
        Self {
            store: Arc::clone(reloader.store()),
            sessions,
            reloader,
            remote,
            config,
        }
    }
}
