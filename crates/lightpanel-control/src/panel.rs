//! The panel tick.
//!
//! One task owns the [`ReconciliationEngine`] and its view. It never awaits
//! remote I/O itself:
//!
//! ```text
//!            reload events ──┐
//!                    taps ───┤
//!   poll results ◄───────┐   ▼
//!                        │ ┌──────────┐  PollRequest  ┌─────────────┐
//!                        │ │   tick   │──────────────▶│ poll worker │
//!                        │ │ (engine) │               └──────┬──────┘
//!                        │ └────┬─────┘                      │ fetch_state × N
//!                        │      │ spawn toggle               ▼
//!                        └──────┴──────────────────────▶  LightApi
//! ```
//!
//! The worker polls lights of one request concurrently and only takes the next
//! request once every light has answered, so results for a given light arrive
//! in poll order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use lightpanel_core::RemoteSettings;
use lightpanel_store::ConfigSnapshot;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::{toggle, PollOutcome, ReconciliationEngine, TapEvent};
use crate::reload::ReloadEvent;
use crate::remote::{Connector, LightApi, RemoteConfig};
use crate::view::LightView;

/// Panel timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    /// Time between polls of every light.
    pub poll_interval: Duration,
    /// Timeouts for each remote call.
    pub remote: RemoteConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            remote: RemoteConfig::default(),
        }
    }
}

/// Ask the worker to poll every light of a snapshot.
#[derive(Debug, Clone)]
pub struct PollRequest {
    /// Snapshot whose lights should be polled.
    pub snapshot: Arc<ConfigSnapshot>,
}

/// One light's poll outcome, tagged with where it belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollResult {
    /// Generation of the snapshot that was polled.
    pub generation: u64,
    /// Light position in that snapshot.
    pub index: usize,
    /// What the remote said.
    pub outcome: PollOutcome,
}

/// Cloneable handle for feeding taps into a running panel.
#[derive(Debug, Clone)]
pub struct PanelHandle {
    taps: mpsc::UnboundedSender<TapEvent>,
}

impl PanelHandle {
    /// Deliver a tap. Returns `false` if the panel has stopped.
    pub fn tap(&self, event: TapEvent) -> bool {
        self.taps.send(event).is_ok()
    }
}

/// Remote client for the current credentials, rebuilt when they change.
struct RemoteCache {
    connector: Arc<dyn Connector>,
    current: Option<(RemoteSettings, Arc<dyn LightApi>)>,
    unconfigured_generation: u64,
}

impl RemoteCache {
    fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            current: None,
            unconfigured_generation: 0,
        }
    }

    fn client_for(&mut self, snapshot: &ConfigSnapshot) -> Option<Arc<dyn LightApi>> {
        let Some(settings) = snapshot.config().remote() else {
            if self.unconfigured_generation != snapshot.generation() {
                info!(generation = snapshot.generation(), "Remote service not configured; skipping polls");
                self.unconfigured_generation = snapshot.generation();
            }
            self.current = None;
            return None;
        };

        if let Some((cached, api)) = &self.current {
            if *cached == settings {
                return Some(Arc::clone(api));
            }
        }

        match self.connector.connect(&settings) {
            Ok(api) => {
                info!(base_url = settings.base_url(), "Remote client created");
                self.current = Some((settings, Arc::clone(&api)));
                Some(api)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create remote client");
                self.current = None;
                None
            }
        }
    }
}

/// The panel: engine, view, and the loop that drives them.
pub struct Panel<V> {
    engine: ReconciliationEngine<V>,
    reloads: mpsc::UnboundedReceiver<ReloadEvent>,
    taps: mpsc::UnboundedReceiver<TapEvent>,
    remote: Arc<Mutex<RemoteCache>>,
    config: PanelConfig,
}

impl<V: LightView + 'static> Panel<V> {
    /// Build a panel showing `initial` and listening for `reloads`.
    pub fn new(
        initial: Arc<ConfigSnapshot>,
        view: V,
        reloads: mpsc::UnboundedReceiver<ReloadEvent>,
        connector: Arc<dyn Connector>,
        config: PanelConfig,
    ) -> (Self, PanelHandle) {
        let mut engine = ReconciliationEngine::new(view);
        engine.rebuild(initial);

        let (tap_tx, taps) = mpsc::unbounded_channel();
        let panel = Self {
            engine,
            reloads,
            taps,
            remote: Arc::new(Mutex::new(RemoteCache::new(connector))),
            config,
        };
        (panel, PanelHandle { taps: tap_tx })
    }

    /// Run until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// Polls once immediately, then every `poll_interval`. Waits for the poll
    /// worker and every toggle still in flight before returning; each remote
    /// call is bounded by its request timeout.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let Self {
            mut engine,
            mut reloads,
            mut taps,
            remote,
            config,
        } = self;

        let (poll_tx, poll_rx) = mpsc::channel(1);
        let (result_tx, mut results) = mpsc::unbounded_channel();
        let worker = tokio::spawn(poll_worker(Arc::clone(&remote), poll_rx, result_tx));
        let mut toggles = JoinSet::new();

        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            generation = engine.generation(),
            poll_interval_ms = u64::try_from(config.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Panel started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                Some(event) = reloads.recv() => {
                    if engine.rebuild(event.snapshot) {
                        request_poll(&engine, &poll_tx);
                    }
                }
                Some(result) = results.recv() => {
                    engine.apply_poll(result.generation, result.index, result.outcome);
                }
                Some(tap) = taps.recv() => {
                    handle_tap(&mut engine, &remote, &mut toggles, tap);
                }
                Some(joined) = toggles.join_next(), if !toggles.is_empty() => {
                    reap_toggle(joined);
                }
                _ = ticker.tick() => {
                    request_poll(&engine, &poll_tx);
                }
            }
        }

        drop(poll_tx);
        if !toggles.is_empty() {
            debug!(pending = toggles.len(), "Waiting for in-flight toggles");
        }
        while let Some(joined) = toggles.join_next().await {
            reap_toggle(joined);
        }
        if let Err(e) = worker.await {
            warn!(error = %e, "Poll worker ended abnormally");
        }
        info!("Panel stopped");
    }
}

fn request_poll<V: LightView>(
    engine: &ReconciliationEngine<V>,
    poll_tx: &mpsc::Sender<PollRequest>,
) {
    let Some(snapshot) = engine.snapshot() else {
        return;
    };
    let request = PollRequest {
        snapshot: Arc::clone(snapshot),
    };
    if poll_tx.try_send(request).is_err() {
        debug!(generation = engine.generation(), "Previous poll still running; skipping");
    }
}

fn handle_tap<V: LightView>(
    engine: &mut ReconciliationEngine<V>,
    remote: &Mutex<RemoteCache>,
    toggles: &mut JoinSet<()>,
    tap: TapEvent,
) {
    let Some(request) = engine.apply_tap(tap) else {
        return;
    };
    let Some(snapshot) = engine.snapshot() else {
        return;
    };
    let Some(api) = remote.lock().client_for(snapshot) else {
        debug!(entity_id = %request.entity_id, "No remote configured; tap is display-only");
        return;
    };

    debug!(entity_id = %request.entity_id, generation = request.generation, "Toggling");
    toggles.spawn(async move {
        // Failures are logged by `toggle` and corrected by the next poll.
        let _ = toggle(api.as_ref(), &request.entity_id).await;
    });
}

fn reap_toggle(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "Toggle task ended abnormally");
    }
}

async fn poll_worker(
    remote: Arc<Mutex<RemoteCache>>,
    mut requests: mpsc::Receiver<PollRequest>,
    results: mpsc::UnboundedSender<PollResult>,
) {
    while let Some(PollRequest { snapshot }) = requests.recv().await {
        let Some(api) = remote.lock().client_for(&snapshot) else {
            continue;
        };
        let generation = snapshot.generation();

        let polls = snapshot
            .config()
            .lights()
            .iter()
            .enumerate()
            .map(|(index, light)| {
                let api = Arc::clone(&api);
                let results = results.clone();
                async move {
                    let outcome = PollOutcome::from(api.fetch_state(light.entity_id()).await);
                    if let PollOutcome::Connection = outcome {
                        debug!(entity_id = %light.entity_id(), "Remote unreachable; keeping last state");
                    }
                    let _ = results.send(PollResult {
                        generation,
                        index,
                        outcome,
                    });
                }
            });
        join_all(polls).await;
    }
    debug!("Poll worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::{MockConnector, MockLightApi, RemoteResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::view::{RecordingView, ViewEvent};
    use lightpanel_core::{ConfigDocument, Configuration, EntityId, LightEntry, LightState};
    use tokio::task::JoinHandle;

    struct Harness {
        view: RecordingView,
        api: Arc<MockLightApi>,
        connector: MockConnector,
        handle: PanelHandle,
        reload_tx: mpsc::UnboundedSender<ReloadEvent>,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    }

    impl Harness {
        async fn stop(self) {
            self.shutdown.send(true).unwrap();
            tokio::time::timeout(Duration::from_secs(5), self.task)
                .await
                .unwrap()
                .unwrap();
        }
    }

    fn snapshot(generation: u64, url: Option<&str>, ids: &[&str]) -> Arc<ConfigSnapshot> {
        let config = Configuration::try_from(ConfigDocument {
            remote_url: url.map(str::to_string),
            remote_token: url.map(|_| "token".to_string()),
            lights: ids.iter().map(|id| LightEntry::new(*id, "L", "bulb")).collect(),
            ..Default::default()
        })
        .unwrap();
        Arc::new(ConfigSnapshot::new(generation, config))
    }

    fn start(initial: Arc<ConfigSnapshot>, api: MockLightApi, poll_interval: Duration) -> Harness {
        let view = RecordingView::new();
        let api = Arc::new(api);
        let connector = MockConnector::new(Arc::clone(&api));
        let (reload_tx, reload_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let (panel, handle) = Panel::new(
            initial,
            view.clone(),
            reload_rx,
            Arc::new(connector.clone()),
            PanelConfig {
                poll_interval,
                remote: RemoteConfig::default(),
            },
        );
        let task = tokio::spawn(panel.run(shutdown_rx));

        Harness {
            view,
            api,
            connector,
            handle,
            reload_tx,
            shutdown,
            task,
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn initial_poll_renders_remote_state() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::On));
        api.set("light.b", Err(RemoteError::Status(500)));

        let h = start(
            snapshot(1, Some("http://remote.test"), &["light.a", "light.b"]),
            api,
            Duration::from_secs(3600),
        );

        wait_for(|| h.view.last_state(0) == Some(LightState::On)).await;
        wait_for(|| h.view.last_state(1) == Some(LightState::Unknown)).await;
        assert_eq!(
            h.view.events()[0],
            ViewEvent::Rebuilt(vec!["light.a".into(), "light.b".into()])
        );
        h.stop().await;
    }

    #[tokio::test]
    async fn tap_renders_then_toggles_remote() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::On));

        let h = start(
            snapshot(1, Some("http://remote.test"), &["light.a"]),
            api,
            Duration::from_secs(3600),
        );
        wait_for(|| h.view.last_state(0) == Some(LightState::On)).await;

        assert!(h.handle.tap(TapEvent {
            entity_id: EntityId::parse("light.a").unwrap(),
            previous: LightState::On,
        }));

        wait_for(|| h.view.last_state(0) == Some(LightState::Off)).await;
        wait_for(|| !h.api.calls().is_empty()).await;
        assert_eq!(h.api.calls(), vec![("light.a".to_string(), false)]);
        h.stop().await;
    }

    #[tokio::test]
    async fn periodic_poll_corrects_state() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::Off));

        let h = start(
            snapshot(1, Some("http://remote.test"), &["light.a"]),
            api,
            Duration::from_millis(20),
        );
        wait_for(|| h.view.last_state(0) == Some(LightState::Off)).await;

        h.api.set("light.a", Ok(LightState::On));
        wait_for(|| h.view.last_state(0) == Some(LightState::On)).await;
        h.stop().await;
    }

    #[tokio::test]
    async fn reload_event_rebuilds_and_polls_new_list() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::On));
        api.set("light.b", Ok(LightState::Off));

        let h = start(
            snapshot(1, Some("http://remote.test"), &["light.a"]),
            api,
            Duration::from_secs(3600),
        );
        wait_for(|| h.view.last_state(0) == Some(LightState::On)).await;
        h.view.clear();

        h.reload_tx
            .send(ReloadEvent {
                snapshot: snapshot(2, Some("http://remote.test"), &["light.b", "light.a"]),
            })
            .unwrap();

        wait_for(|| h.view.last_state(0) == Some(LightState::Off)).await;
        wait_for(|| h.view.last_state(1) == Some(LightState::On)).await;
        assert_eq!(
            h.view.events()[0],
            ViewEvent::Rebuilt(vec!["light.b".into(), "light.a".into()])
        );
        // Same credentials: the client is reused.
        assert_eq!(h.connector.connects().len(), 1);
        h.stop().await;
    }

    #[tokio::test]
    async fn credential_change_recreates_client() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::On));

        let h = start(
            snapshot(1, Some("http://old.test"), &["light.a"]),
            api,
            Duration::from_secs(3600),
        );
        wait_for(|| h.connector.connects().len() == 1).await;

        h.reload_tx
            .send(ReloadEvent {
                snapshot: snapshot(2, Some("http://new.test"), &["light.a"]),
            })
            .unwrap();

        wait_for(|| h.connector.connects().len() == 2).await;
        assert_eq!(h.connector.connects()[1].base_url(), "http://new.test");
        h.stop().await;
    }

    #[tokio::test]
    async fn no_remote_means_no_polls() {
        let api = MockLightApi::new();
        api.set("light.a", Ok(LightState::On));

        let h = start(snapshot(1, None, &["light.a"]), api, Duration::from_millis(20));

        h.handle.tap(TapEvent {
            entity_id: EntityId::parse("light.a").unwrap(),
            previous: LightState::Off,
        });
        wait_for(|| h.view.last_state(0) == Some(LightState::On)).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.connector.connects().is_empty());
        assert!(h.api.calls().is_empty());
        h.stop().await;
    }

    /// Remote whose service calls take a while to answer.
    #[derive(Default)]
    struct SlowApi {
        started: AtomicBool,
        finished: AtomicBool,
    }

    #[async_trait]
    impl LightApi for SlowApi {
        async fn fetch_state(&self, _entity_id: &EntityId) -> RemoteResult<LightState> {
            Ok(LightState::Off)
        }

        async fn set_state(&self, _entity_id: &EntityId, _on: bool) -> RemoteResult<()> {
            self.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct SlowConnector(Arc<SlowApi>);

    impl Connector for SlowConnector {
        fn connect(&self, _settings: &RemoteSettings) -> crate::Result<Arc<dyn LightApi>> {
            let api: Arc<dyn LightApi> = self.0.clone();
            Ok(api)
        }
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_toggle() {
        let api = Arc::new(SlowApi::default());
        let (_reload_tx, reload_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let (panel, handle) = Panel::new(
            snapshot(1, Some("http://remote.test"), &["light.a"]),
            RecordingView::new(),
            reload_rx,
            Arc::new(SlowConnector(Arc::clone(&api))),
            PanelConfig {
                poll_interval: Duration::from_secs(3600),
                remote: RemoteConfig::default(),
            },
        );
        let task = tokio::spawn(panel.run(shutdown_rx));

        assert!(handle.tap(TapEvent {
            entity_id: EntityId::parse("light.a").unwrap(),
            previous: LightState::Off,
        }));
        wait_for(|| api.started.load(Ordering::SeqCst)).await;
        assert!(!api.finished.load(Ordering::SeqCst));

        shutdown.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert!(api.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn shutdown_stops_panel_and_handle() {
        let h = start(
            snapshot(1, None, &[]),
            MockLightApi::new(),
            Duration::from_secs(3600),
        );
        let handle = h.handle.clone();
        h.stop().await;

        assert!(!handle.tap(TapEvent {
            entity_id: EntityId::parse("light.a").unwrap(),
            previous: LightState::Off,
        }));
    }
}
