//! Client for the remote light service.
//!
//! The engine only sees the [`LightApi`] trait; [`HttpLightApi`] is the real
//! implementation speaking the REST protocol:
//!
//! - `GET  <base>/api/states/<entity_id>` returns `{"state": "on" | "off" | ...}`
//! - `POST <base>/api/services/<domain>/turn_on|turn_off` with `{"entity_id": ...}`
//!
//! Every request carries `Authorization: Bearer <token>`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lightpanel_core::{EntityId, LightState, RemoteSettings};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, RemoteError};

/// Result of a remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Trait for remote light service communication.
///
/// This trait abstracts the HTTP client, allowing scripted implementations in
/// tests.
#[async_trait]
pub trait LightApi: Send + Sync {
    /// Read the current state of a light.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Connection`] if there is no response,
    /// [`RemoteError::Status`] for an error status and
    /// [`RemoteError::Malformed`] if the body has no usable `state`.
    async fn fetch_state(&self, entity_id: &EntityId) -> RemoteResult<LightState>;

    /// Ask the remote to switch a light on or off.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Connection`] or [`RemoteError::Status`].
    async fn set_state(&self, entity_id: &EntityId, on: bool) -> RemoteResult<()>;
}

/// Builds a [`LightApi`] for a given set of credentials.
///
/// The poll worker calls this again whenever the configured URL or token
/// changes.
pub trait Connector: Send + Sync {
    /// Create a client for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    fn connect(&self, settings: &RemoteSettings) -> crate::Result<Arc<dyn LightApi>>;
}

/// Timeouts applied to every remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteConfig {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of probing a remote with `GET /api/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCheck {
    /// Whether the URL and token work.
    pub ok: bool,
    /// Human-readable result.
    pub message: String,
}

impl ConnectionCheck {
    fn new(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
        }
    }
}

/// HTTP client for the remote light service.
#[derive(Debug, Clone)]
pub struct HttpLightApi {
    client: reqwest::Client,
    settings: RemoteSettings,
}

impl HttpLightApi {
    /// Create a client with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Internal`] if the HTTP client cannot be built.
    pub fn new(settings: RemoteSettings, config: &RemoteConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ControlError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    /// Create a client around an existing reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, settings: RemoteSettings) -> Self {
        Self { client, settings }
    }

    /// The base URL requests go to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.settings.base_url()
    }

    /// Request the remote API root to check the URL and token.
    pub async fn check(&self) -> ConnectionCheck {
        let url = format!("{}/api/", self.settings.base_url());
        match self
            .client
            .get(&url)
            .bearer_auth(self.settings.token())
            .send()
            .await
        {
            Ok(response) => match response.status().as_u16() {
                200 => ConnectionCheck::new(true, "Connected successfully"),
                401 => ConnectionCheck::new(false, "URL reachable but token is invalid (401)"),
                code => ConnectionCheck::new(false, format!("Unexpected response (HTTP {code})")),
            },
            Err(e) => ConnectionCheck::new(false, format!("Cannot reach remote service: {e}")),
        }
    }
}

/// State body returned by `GET /api/states/<id>`.
#[derive(Debug, Deserialize)]
struct StateResponse {
    state: String,
}

/// Body of a `turn_on` / `turn_off` call.
#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    entity_id: &'a str,
}

#[async_trait]
impl LightApi for HttpLightApi {
    async fn fetch_state(&self, entity_id: &EntityId) -> RemoteResult<LightState> {
        let url = format!("{}/api/states/{}", self.settings.base_url(), entity_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.settings.token())
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(entity_id = %entity_id, status = %status, "State request rejected");
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let parsed: StateResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))?;

        Ok(LightState::from_remote(&parsed.state))
    }

    async fn set_state(&self, entity_id: &EntityId, on: bool) -> RemoteResult<()> {
        let service = if on { "turn_on" } else { "turn_off" };
        let url = format!(
            "{}/api/services/{}/{}",
            self.settings.base_url(),
            entity_id.domain(),
            service
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.settings.token())
            .json(&ServiceRequest {
                entity_id: entity_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(entity_id = %entity_id, service, "Service call accepted");
            Ok(())
        } else {
            tracing::warn!(entity_id = %entity_id, service, status = %status, "Service call rejected");
            Err(RemoteError::Status(status.as_u16()))
        }
    }
}

/// [`Connector`] producing [`HttpLightApi`] clients.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: RemoteConfig,
}

impl HttpConnector {
    /// Create a connector applying `config` to every client.
    #[must_use]
    pub const fn new(config: RemoteConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, settings: &RemoteSettings) -> crate::Result<Arc<dyn LightApi>> {
        let api = HttpLightApi::new(settings.clone(), &self.config)?;
        Ok(Arc::new(api))
    }
}

/// Scripted in-memory remote for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockLightApi {
    states: parking_lot::Mutex<std::collections::HashMap<String, RemoteResult<LightState>>>,
    calls: parking_lot::Mutex<Vec<(String, bool)>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockLightApi {
    /// Create an empty mock; unknown entities answer `Status(404)`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what `fetch_state` returns for an entity.
    pub fn set(&self, entity_id: &str, result: RemoteResult<LightState>) {
        self.states.lock().insert(entity_id.to_string(), result);
    }

    /// `set_state` calls received so far, as `(entity_id, on)`.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl LightApi for MockLightApi {
    async fn fetch_state(&self, entity_id: &EntityId) -> RemoteResult<LightState> {
        self.states
            .lock()
            .get(entity_id.as_str())
            .cloned()
            .unwrap_or(Err(RemoteError::Status(404)))
    }

    async fn set_state(&self, entity_id: &EntityId, on: bool) -> RemoteResult<()> {
        self.calls.lock().push((entity_id.to_string(), on));
        let state = if on { LightState::On } else { LightState::Off };
        self.states
            .lock()
            .insert(entity_id.to_string(), Ok(state));
        Ok(())
    }
}

/// [`Connector`] that always hands out the same mock.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct MockConnector {
    api: Arc<MockLightApi>,
    connects: Arc<parking_lot::Mutex<Vec<RemoteSettings>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockConnector {
    /// Wrap a mock remote.
    #[must_use]
    pub fn new(api: Arc<MockLightApi>) -> Self {
        Self {
            api,
            connects: Arc::default(),
        }
    }

    /// Settings passed to each `connect` call.
    #[must_use]
    pub fn connects(&self) -> Vec<RemoteSettings> {
        self.connects.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Connector for MockConnector {
    fn connect(&self, settings: &RemoteSettings) -> crate::Result<Arc<dyn LightApi>> {
        self.connects.lock().push(settings.clone());
        Ok(self.api.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpLightApi) {
        let server = MockServer::start().await;
        let api = HttpLightApi::new(
            RemoteSettings::new(server.uri(), "secret"),
            &RemoteConfig::default(),
        )
        .unwrap();
        (server, api)
    }

    fn kitchen() -> EntityId {
        EntityId::parse("light.kitchen").unwrap()
    }

    #[tokio::test]
    async fn fetch_state_maps_on_off_and_other() {
        let (server, api) = setup().await;

        for (id, state) in [("light.a", "on"), ("light.b", "off"), ("light.c", "unavailable")] {
            Mock::given(method("GET"))
                .and(path(format!("/api/states/{id}")))
                .and(header("authorization", "Bearer secret"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "entity_id": id,
                    "state": state,
                    "attributes": {}
                })))
                .mount(&server)
                .await;
        }

        let fetch = |id: &str| {
            let id = EntityId::parse(id).unwrap();
            let api = api.clone();
            async move { api.fetch_state(&id).await }
        };
        assert_eq!(fetch("light.a").await, Ok(LightState::On));
        assert_eq!(fetch("light.b").await, Ok(LightState::Off));
        assert_eq!(fetch("light.c").await, Ok(LightState::Unknown));
    }

    #[tokio::test]
    async fn fetch_state_error_status() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/states/light.kitchen"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert_eq!(
            api.fetch_state(&kitchen()).await,
            Err(RemoteError::Status(500))
        );
    }

    #[tokio::test]
    async fn fetch_state_malformed_body() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/states/light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attributes": {}})))
            .mount(&server)
            .await;

        assert!(matches!(
            api.fetch_state(&kitchen()).await,
            Err(RemoteError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn fetch_state_unreachable() {
        let api = HttpLightApi::new(
            RemoteSettings::new("http://127.0.0.1:1", "secret"),
            &RemoteConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            api.fetch_state(&kitchen()).await,
            Err(RemoteError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn set_state_calls_domain_service() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/services/light/turn_off"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"entity_id": "light.kitchen"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        api.set_state(&kitchen(), false).await.unwrap();
    }

    #[tokio::test]
    async fn set_state_uses_switch_domain() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/services/switch/turn_on"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let fan = EntityId::parse("switch.fan").unwrap();
        assert_eq!(api.set_state(&fan, true).await, Err(RemoteError::Status(401)));
    }

    #[tokio::test]
    async fn trailing_slash_is_stripped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/states/light.kitchen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "on"})))
            .mount(&server)
            .await;

        let api = HttpLightApi::new(
            RemoteSettings::new(format!("{}/", server.uri()), "secret"),
            &RemoteConfig::default(),
        )
        .unwrap();
        assert_eq!(api.fetch_state(&kitchen()).await, Ok(LightState::On));
    }

    #[tokio::test]
    async fn check_reports_each_outcome() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let check = api.check().await;
        assert!(check.ok);
        assert_eq!(check.message, "Connected successfully");

        let bad_token = HttpLightApi::new(
            RemoteSettings::new(server.uri(), "wrong"),
            &RemoteConfig::default(),
        )
        .unwrap();
        let check = bad_token.check().await;
        assert!(!check.ok);
        assert!(check.message.contains("token is invalid"));

        let unreachable = HttpLightApi::new(
            RemoteSettings::new("http://127.0.0.1:1", "secret"),
            &RemoteConfig::default(),
        )
        .unwrap();
        let check = unreachable.check().await;
        assert!(!check.ok);
        assert!(check.message.starts_with("Cannot reach"));
    }

    #[tokio::test]
    async fn check_unexpected_status() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let check = api.check().await;
        assert!(!check.ok);
        assert_eq!(check.message, "Unexpected response (HTTP 503)");
    }
}
