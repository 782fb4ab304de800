use std::sync::Mutex as StdMutex;
use std::time::Duration;

use super::history::HistoryPoint;
use super::reconciler::{LiveView, Reconciler};
use crate::fleet::{DroneStatus, EntitySummary};
use crate::telemetry::TelemetrySample;
use crate::track::{TrackAccumulator, TrackView};

/// Tuning knobs shared by the reconciler and track accumulator.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    pub stale_threshold: Duration,
    pub history_capacity: usize,
    pub segment_gap: Duration,
    pub track_point_cap: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        HubSettings {
            stale_threshold: Duration::from_secs(10),
            history_capacity: 120,
            segment_gap: Duration::from_secs(20),
            track_point_cap: 800,
        }
    }
}

/// Aggregates the reconciler and track accumulator behind one handle the
/// connection workers and pollers write to and the web layer reads from.
/// Each component owns its own per-drone map; the hub never hands out
/// mutable access, only cloned snapshots.
pub struct LiveHub {
    reconciler: StdMutex<Reconciler>,
    tracks: StdMutex<TrackAccumulator>,
}

impl LiveHub {
    pub fn new(settings: &HubSettings) -> Self {
        LiveHub {
            reconciler: StdMutex::new(Reconciler::new(
                settings.history_capacity,
                settings.stale_threshold,
            )),
            tracks: StdMutex::new(TrackAccumulator::new(
                settings.segment_gap,
                settings.track_point_cap,
            )),
        }
    }

    pub fn ingest_stream(&self, sample: &TelemetrySample, now_ms: i64) {
        self.reconciler.lock().unwrap().apply_stream(sample, now_ms);
        self.tracks
            .lock()
            .unwrap()
            .record(sample, now_ms as f64 / 1000.0);
    }

    pub fn ingest_polled(&self, sample: &TelemetrySample, now_ms: i64) {
        self.reconciler.lock().unwrap().apply_polled(sample, now_ms);
        self.tracks
            .lock()
            .unwrap()
            .record(sample, now_ms as f64 / 1000.0);
    }

    pub fn apply_summaries(&self, summaries: &[EntitySummary]) {
        let mut tracks = self.tracks.lock().unwrap();
        for summary in summaries {
            tracks.set_status(
                &summary.drone_id,
                DroneStatus::from_label(summary.status.as_deref()),
            );
        }
    }

    pub fn live_view(&self, drone_id: &str, now_ms: i64) -> Option<LiveView> {
        self.reconciler.lock().unwrap().live_view(drone_id, now_ms)
    }

    pub fn history(&self, drone_id: &str) -> Vec<HistoryPoint> {
        self.reconciler.lock().unwrap().history(drone_id)
    }

    pub fn track(&self, drone_id: &str) -> Option<TrackView> {
        self.tracks.lock().unwrap().view(drone_id)
    }

    pub fn all_tracks(&self) -> Vec<TrackView> {
        self.tracks.lock().unwrap().views()
    }
}
