use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::backoff::reconnect_delay;
use super::source::StreamSource;
use super::state::{ConnectionPhase, ConnectionStatus};
use crate::live::LiveHub;
use crate::telemetry::normalize;

#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

struct Slot {
    /// Connection generation; a worker whose epoch no longer matches must
    /// not touch any state.
    epoch: u64,
    status: ConnectionStatus,
    stop: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Registry {
    slots: HashMap<String, Slot>,
    next_epoch: u64,
    shutdown: bool,
}

/// Maintains zero-or-one live connection per active drone. Each drone gets a
/// worker task that owns its connect/read/backoff loop; the registry holds
/// the observable status plus the stop channel for teardown.
pub struct StreamManager {
    cfg: StreamConfig,
    source: Arc<dyn StreamSource>,
    hub: Arc<LiveHub>,
    registry: Arc<StdMutex<Registry>>,
}

impl StreamManager {
    pub fn new(cfg: StreamConfig, source: Arc<dyn StreamSource>, hub: Arc<LiveHub>) -> Self {
        StreamManager {
            cfg,
            source,
            hub,
            registry: Arc::new(StdMutex::new(Registry::default())),
        }
    }

    /// Match running connections to the desired active set: open a stream
    /// for every newly active drone, tear down and forget every drone that
    /// left the set.
    pub fn reconcile(&self, active: &[String]) {
        let mut reg = self.registry.lock().unwrap();
        if reg.shutdown {
            return;
        }

        let wanted: HashSet<&str> = active.iter().map(String::as_str).collect();
        let stale: Vec<String> = reg
            .slots
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for drone_id in stale {
            if let Some(slot) = reg.slots.remove(&drone_id) {
                log::info!("closing stream for {drone_id}");
                stop_worker(slot);
            }
        }

        for drone_id in active {
            if reg.slots.contains_key(drone_id) {
                continue;
            }
            let epoch = reg.next_epoch;
            reg.next_epoch += 1;
            let (stop_tx, stop_rx) = oneshot::channel();
            reg.slots.insert(
                drone_id.clone(),
                Slot {
                    epoch,
                    status: ConnectionStatus::new(),
                    stop: Some(stop_tx),
                    join: None,
                },
            );
            log::info!("opening stream for {drone_id}");
            let join = tokio::spawn(run_connection(
                drone_id.clone(),
                epoch,
                self.cfg,
                Arc::clone(&self.source),
                Arc::clone(&self.hub),
                Arc::clone(&self.registry),
                stop_rx,
            ));
            if let Some(slot) = reg.slots.get_mut(drone_id) {
                slot.join = Some(join);
            }
        }
    }

    /// Manager-wide teardown: stop every worker and forget all state so no
    /// scheduled reconnect can fire afterwards.
    pub fn shutdown(&self) {
        let mut reg = self.registry.lock().unwrap();
        reg.shutdown = true;
        let slots: Vec<(String, Slot)> = reg.slots.drain().collect();
        for (drone_id, slot) in slots {
            log::info!("closing stream for {drone_id}");
            stop_worker(slot);
        }
    }

    pub fn tracked(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry.lock().unwrap().slots.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn phase(&self, drone_id: &str) -> Option<ConnectionPhase> {
        self.registry
            .lock()
            .unwrap()
            .slots
            .get(drone_id)
            .map(|slot| slot.status.phase)
    }

    pub fn status(&self, drone_id: &str) -> Option<ConnectionStatus> {
        self.registry
            .lock()
            .unwrap()
            .slots
            .get(drone_id)
            .map(|slot| slot.status.clone())
    }
}

/// Signal a worker to stop and abort it as a backstop in case it is parked
/// inside a connect that never resolves.
fn stop_worker(mut slot: Slot) {
    if let Some(stop) = slot.stop.take() {
        let _ = stop.send(());
    }
    if let Some(join) = slot.join.take() {
        join.abort();
    }
}

fn is_current(registry: &StdMutex<Registry>, drone_id: &str, epoch: u64) -> bool {
    let reg = registry.lock().unwrap();
    !reg.shutdown && reg.slots.get(drone_id).map(|slot| slot.epoch) == Some(epoch)
}

/// Mutate the slot's status if this worker is still the current one.
/// Returns the retry counter afterwards, or None when superseded.
fn update_status<F>(
    registry: &StdMutex<Registry>,
    drone_id: &str,
    epoch: u64,
    apply: F,
) -> Option<u32>
where
    F: FnOnce(&mut ConnectionStatus),
{
    let mut reg = registry.lock().unwrap();
    if reg.shutdown {
        return None;
    }
    let slot = reg.slots.get_mut(drone_id)?;
    if slot.epoch != epoch {
        return None;
    }
    apply(&mut slot.status);
    Some(slot.status.retries)
}

async fn run_connection(
    drone_id: String,
    epoch: u64,
    cfg: StreamConfig,
    source: Arc<dyn StreamSource>,
    hub: Arc<LiveHub>,
    registry: Arc<StdMutex<Registry>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        if update_status(&registry, &drone_id, epoch, ConnectionStatus::begin_connect).is_none() {
            return;
        }

        let opened = tokio::select! {
            result = source.open(&drone_id) => result,
            _ = &mut stop_rx => return,
        };

        match opened {
            Ok(mut events) => {
                if update_status(&registry, &drone_id, epoch, ConnectionStatus::mark_open)
                    .is_none()
                {
                    return;
                }
                log::info!("stream open for {drone_id}");

                loop {
                    let event = tokio::select! {
                        event = events.next() => event,
                        _ = &mut stop_rx => return,
                    };
                    match event {
                        Some(Ok(raw)) => {
                            if !is_current(&registry, &drone_id, epoch) {
                                return;
                            }
                            // Frames that fail normalization or name another
                            // drone are dropped without disrupting the stream.
                            if let Some(sample) = normalize(&raw) {
                                if sample.drone_id == drone_id {
                                    hub.ingest_stream(
                                        &sample,
                                        chrono::Utc::now().timestamp_millis(),
                                    );
                                }
                            }
                        }
                        Some(Err(err)) => {
                            log::warn!("stream error for {drone_id}: {err}");
                            update_status(&registry, &drone_id, epoch, |status| {
                                status.record_error(err.to_string());
                            });
                        }
                        None => break,
                    }
                }
            }
            Err(err) => {
                log::warn!("stream connect failed for {drone_id}: {err}");
                if update_status(&registry, &drone_id, epoch, |status| {
                    status.record_error(err.to_string());
                })
                .is_none()
                {
                    return;
                }
            }
        }

        let retries = match update_status(&registry, &drone_id, epoch, ConnectionStatus::mark_closed)
        {
            Some(retries) => retries,
            None => return,
        };
        let delay = reconnect_delay(cfg.base_delay, cfg.max_delay, retries);
        log::debug!("reconnecting {drone_id} in {delay:?} (attempt {retries})");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut stop_rx => return,
        }
        // Membership is re-checked at the top of the loop, so a reconnect
        // scheduled for a since-removed drone is a no-op.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::HubSettings;
    use crate::stream::source::{StreamError, StreamEvents};
    use futures_util::future::BoxFuture;
    use futures_util::stream;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that answers every open with the same finite list of frames
    /// (or a connect failure) and records which drones it was opened for.
    struct ScriptedSource {
        opens: AtomicUsize,
        opened_ids: StdMutex<Vec<String>>,
        frames: Vec<serde_json::Value>,
        refuse: bool,
    }

    impl ScriptedSource {
        fn new(frames: Vec<serde_json::Value>) -> Self {
            ScriptedSource {
                opens: AtomicUsize::new(0),
                opened_ids: StdMutex::new(Vec::new()),
                frames,
                refuse: false,
            }
        }

        fn refusing() -> Self {
            ScriptedSource {
                refuse: true,
                ..ScriptedSource::new(Vec::new())
            }
        }

        fn open_count(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    impl StreamSource for ScriptedSource {
        fn open(&self, drone_id: &str) -> BoxFuture<'static, Result<StreamEvents, StreamError>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.opened_ids.lock().unwrap().push(drone_id.to_string());
            if self.refuse {
                return Box::pin(async {
                    Err::<StreamEvents, StreamError>(StreamError::Connect("refused".into()))
                });
            }
            let frames: Vec<Result<serde_json::Value, StreamError>> =
                self.frames.iter().cloned().map(Ok).collect();
            Box::pin(async move { Ok(Box::pin(stream::iter(frames)) as StreamEvents) })
        }
    }

    fn test_manager(source: Arc<ScriptedSource>) -> (StreamManager, Arc<LiveHub>) {
        let hub = Arc::new(LiveHub::new(&HubSettings::default()));
        let cfg = StreamConfig {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        };
        let manager = StreamManager::new(cfg, source, Arc::clone(&hub));
        (manager, hub)
    }

    #[tokio::test(start_paused = true)]
    async fn stream_samples_reach_the_hub() {
        let source = Arc::new(ScriptedSource::new(vec![
            json!({"id": "D1", "lat": 1.0, "lon": 2.0, "ts": 5.0, "battery": 80.0}),
        ]));
        let (manager, hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let view = hub.live_view("D1", 10_000).expect("live view");
        assert_eq!(view.sample.lat, Some(1.0));
        assert_eq!(view.sample.battery_pct, Some(80.0));
        assert_eq!(*source.opened_ids.lock().unwrap(), vec!["D1".to_string()]);
        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_stream_reconnects_after_base_delay() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (manager, _hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.open_count(), 1);
        assert_eq!(manager.phase("D1"), Some(ConnectionPhase::Closed));
        assert_eq!(manager.status("D1").unwrap().retries, 1);

        // reopened for the same drone once the base delay elapses
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(source.open_count(), 2);
        assert_eq!(
            *source.opened_ids.lock().unwrap(),
            vec!["D1".to_string(), "D1".to_string()]
        );
        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connects_back_off_exponentially() {
        let source = Arc::new(ScriptedSource::refusing());
        let (manager, _hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.open_count(), 1);
        assert_eq!(
            manager.status("D1").unwrap().last_error.as_deref(),
            Some("connect failed: refused")
        );

        // retries at t=1000, t=3000, t=7000
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(source.open_count(), 2);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(source.open_count(), 3);
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(source.open_count(), 4);
        assert_eq!(manager.status("D1").unwrap().retries, 4);
        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn removed_drone_stops_reconnecting() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (manager, _hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let opens_before = source.open_count();

        manager.reconcile(&[]);
        assert_eq!(manager.phase("D1"), None);

        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(source.open_count(), opens_before);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_worker() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (manager, _hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string(), "D2".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.open_count(), 2);

        manager.shutdown();
        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(source.open_count(), 2);
        assert!(manager.tracked().is_empty());

        // reconcile after shutdown is a no-op
        manager.reconcile(&["D3".to_string()]);
        assert!(manager.tracked().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_keeps_existing_connections() {
        let source = Arc::new(ScriptedSource::new(Vec::new()));
        let (manager, _hub) = test_manager(Arc::clone(&source));

        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // same active set: no second connection for D1
        manager.reconcile(&["D1".to_string()]);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(manager.tracked(), vec!["D1".to_string()]);
        manager.shutdown();
    }

    #[test]
    fn epoch_mismatch_is_not_current() {
        let registry = StdMutex::new(Registry::default());
        registry.lock().unwrap().slots.insert(
            "D1".to_string(),
            Slot {
                epoch: 7,
                status: ConnectionStatus::new(),
                stop: None,
                join: None,
            },
        );
        assert!(is_current(&registry, "D1", 7));
        assert!(!is_current(&registry, "D1", 6));
        assert!(!is_current(&registry, "D2", 7));

        registry.lock().unwrap().shutdown = true;
        assert!(!is_current(&registry, "D1", 7));
    }
}
