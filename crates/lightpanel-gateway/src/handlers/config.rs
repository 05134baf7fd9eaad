//! Configuration API endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use lightpanel_control::{ConnectionCheck, HttpLightApi};
use lightpanel_core::{ConfigDocument, Configuration, LightEntry, RemoteSettings};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Editable configuration fields, as read and written by the settings page.
///
/// The password hash is deliberately absent: it is never sent out and never
/// taken from a request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBody {
    /// Remote base URL (empty when unset).
    #[serde(default, alias = "ha_url")]
    pub remote_url: String,
    /// Remote bearer token (empty when unset).
    #[serde(default, alias = "ha_token")]
    pub remote_token: String,
    /// Lights in display order.
    #[serde(default)]
    pub lights: Vec<LightEntry>,
}

/// `{"ok": true}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    /// Always `true`.
    pub ok: bool,
}

/// Body of `POST /api/test-connection`.
#[derive(Debug, Deserialize)]
pub struct TestConnectionBody {
    /// URL to check.
    #[serde(default, alias = "ha_url")]
    pub remote_url: String,
    /// Token to check with.
    #[serde(default, alias = "ha_token")]
    pub remote_token: String,
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `GET /api/config`: current editable fields.
pub async fn get_config(
    _user: SessionUser,
    State(state): State<Arc<GatewayState>>,
) -> Json<ConfigBody> {
    let body = state.store.current().map_or_else(
        || ConfigBody {
            remote_url: String::new(),
            remote_token: String::new(),
            lights: Vec::new(),
        },
        |snapshot| {
            let config = snapshot.config();
            ConfigBody {
                remote_url: config.remote_url().unwrap_or_default().to_string(),
                remote_token: config.remote_token().unwrap_or_default().to_string(),
                lights: config.lights().iter().map(LightEntry::from).collect(),
            }
        },
    );
    Json(body)
}

/// `POST /api/config`: validate, save, reload.
///
/// Answers only after the new configuration has been published.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for an invalid body and
/// [`ApiError::Internal`] if saving or reloading fails. In every error case
/// the running configuration is unchanged.
pub async fn update_config(
    _user: SessionUser,
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<ConfigBody>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let web_password_hash = state
        .store
        .current()
        .and_then(|snapshot| snapshot.config().web_password_hash().map(str::to_string));

    let config = Configuration::try_from(ConfigDocument {
        remote_url: non_empty(body.remote_url),
        remote_token: non_empty(body.remote_token),
        web_password_hash,
        lights: body.lights,
    })
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let lights = config.lights().len();
    let reloader = state.reloader.clone();
    let snapshot = tokio::task::spawn_blocking(move || reloader.save_and_reload(&config))
        .await
        .map_err(|e| ApiError::Internal(format!("save task failed: {e}")))??;

    info!(generation = snapshot.generation(), lights, "Configuration updated from web");
    Ok(Json(OkResponse { ok: true }))
}

/// `POST /api/test-connection`: check a remote URL and token.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for an invalid body.
pub async fn test_connection(
    _user: SessionUser,
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<TestConnectionBody>, JsonRejection>,
) -> Result<Json<ConnectionCheck>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if body.remote_url.trim().is_empty() {
        return Ok(Json(ConnectionCheck {
            ok: false,
            message: "Remote URL is empty".to_string(),
        }));
    }

    let settings = RemoteSettings::new(body.remote_url.trim(), body.remote_token);
    let api = HttpLightApi::new(settings, &state.remote)?;
    Ok(Json(api.check().await))
}
