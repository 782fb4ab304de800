use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use super::client::FleetApi;
use super::store::FleetStore;
use super::types::DroneStatus;
use crate::live::LiveHub;
use crate::stream::{ConnectionPhase, StreamManager};
use crate::telemetry::normalize;

/// Start the snapshot loop (which also drives the manager's active set) and
/// the per-drone fallback poll loop.
pub fn spawn_pollers(
    client: Arc<FleetApi>,
    store: Arc<FleetStore>,
    hub: Arc<LiveHub>,
    manager: Arc<StreamManager>,
    snapshot_interval: Duration,
    poll_interval: Duration,
) {
    tokio::spawn(run_snapshot_loop(
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&manager),
        snapshot_interval,
    ));
    tokio::spawn(run_fallback_poll_loop(
        client,
        store,
        hub,
        manager,
        poll_interval,
    ));
}

async fn run_snapshot_loop(
    client: Arc<FleetApi>,
    store: Arc<FleetStore>,
    hub: Arc<LiveHub>,
    manager: Arc<StreamManager>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match client.fetch_snapshot().await {
            Ok(drones) => {
                hub.apply_summaries(&drones);
                let active: Vec<String> = drones
                    .iter()
                    .filter(|d| DroneStatus::from_label(d.status.as_deref()).is_active())
                    .map(|d| d.drone_id.clone())
                    .collect();
                log::debug!("snapshot: {} drones, {} active", drones.len(), active.len());
                store.update(drones, Utc::now().timestamp_millis());
                manager.reconcile(&active);
            }
            Err(err) => {
                log::warn!("fleet snapshot fetch failed: {err}");
                store.record_error(err.to_string());
            }
        }
    }
}

/// Poll fallback: only drones whose stream is not open are fetched, so
/// polling suspends while the stream delivers and resumes on close.
async fn run_fallback_poll_loop(
    client: Arc<FleetApi>,
    store: Arc<FleetStore>,
    hub: Arc<LiveHub>,
    manager: Arc<StreamManager>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        for drone_id in manager.tracked() {
            if manager.phase(&drone_id) == Some(ConnectionPhase::Open) {
                continue;
            }
            match client.fetch_latest(&drone_id).await {
                Ok(raw) => {
                    if let Some(sample) = normalize(&raw) {
                        if sample.drone_id == drone_id {
                            hub.ingest_polled(&sample, Utc::now().timestamp_millis());
                        }
                    }
                }
                Err(err) => {
                    log::warn!("poll fallback failed for {drone_id}: {err}");
                    store.record_error(format!("{drone_id}: {err}"));
                }
            }
        }
    }
}
