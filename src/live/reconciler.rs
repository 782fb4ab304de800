use std::collections::HashMap;
use std::time::Duration;

use super::history::{History, HistoryPoint};
use crate::telemetry::TelemetrySample;

/// Point-in-time view of one drone's reconciled live state.
#[derive(Debug, Clone)]
pub struct LiveView {
    pub sample: TelemetrySample,
    pub stale: bool,
    pub last_update_ms: Option<i64>,
}

struct EntityLive {
    stream: Option<TelemetrySample>,
    polled: Option<TelemetrySample>,
    history: History,
    /// Single point seeded from a polled sample, shown only until real
    /// stream history takes over.
    seed: Option<HistoryPoint>,
}

impl EntityLive {
    fn new(history_capacity: usize) -> Self {
        EntityLive {
            stream: None,
            polled: None,
            history: History::new(history_capacity),
            seed: None,
        }
    }
}

/// Merges per-drone stream and poll-fallback samples into one live view plus
/// a bounded history. State is keyed per drone and survives selection
/// changes; callers only choose which drone's view to read.
pub struct Reconciler {
    history_capacity: usize,
    stale_threshold_ms: i64,
    entities: HashMap<String, EntityLive>,
}

impl Reconciler {
    pub fn new(history_capacity: usize, stale_threshold: Duration) -> Self {
        Reconciler {
            history_capacity,
            stale_threshold_ms: stale_threshold.as_millis() as i64,
            entities: HashMap::new(),
        }
    }

    fn entry(&mut self, drone_id: &str) -> &mut EntityLive {
        let capacity = self.history_capacity;
        self.entities
            .entry(drone_id.to_string())
            .or_insert_with(|| EntityLive::new(capacity))
    }

    pub fn apply_stream(&mut self, sample: &TelemetrySample, now_ms: i64) {
        let entry = self.entry(&sample.drone_id);
        entry.seed = None;
        entry.history.push(history_point(sample, now_ms));
        entry.stream = Some(sample.clone());
    }

    pub fn apply_polled(&mut self, sample: &TelemetrySample, now_ms: i64) {
        let entry = self.entry(&sample.drone_id);
        if entry.stream.is_none() && entry.history.is_empty() {
            entry.seed = Some(history_point(sample, now_ms));
        }
        entry.polled = Some(sample.clone());
    }

    /// Current-value view: a stream sample takes precedence, the polled
    /// sample only seeds state before the first stream sample arrives.
    pub fn live_view(&self, drone_id: &str, now_ms: i64) -> Option<LiveView> {
        let entry = self.entities.get(drone_id)?;
        let sample = entry.stream.clone().or_else(|| entry.polled.clone())?;
        let last_update_ms = sample.update_time_ms();
        let stale = match last_update_ms {
            Some(t) => now_ms - t > self.stale_threshold_ms,
            None => true,
        };
        Some(LiveView {
            sample,
            stale,
            last_update_ms,
        })
    }

    pub fn history(&self, drone_id: &str) -> Vec<HistoryPoint> {
        match self.entities.get(drone_id) {
            Some(entry) if !entry.history.is_empty() => entry.history.to_vec(),
            Some(entry) => entry.seed.into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn history_point(sample: &TelemetrySample, now_ms: i64) -> HistoryPoint {
    HistoryPoint {
        time_ms: sample.update_time_ms().unwrap_or(now_ms),
        altitude: sample.alt_m,
        battery: sample.battery_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, ts: Option<f64>) -> TelemetrySample {
        TelemetrySample {
            event_ts: ts,
            ..TelemetrySample::empty(id)
        }
    }

    #[test]
    fn polled_sample_seeds_until_stream_arrives() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));

        let mut polled = sample("D1", Some(1.0));
        polled.battery_pct = Some(40.0);
        reconciler.apply_polled(&polled, 1_000);
        assert_eq!(reconciler.live_view("D1", 2_000).unwrap().sample.battery_pct, Some(40.0));
        assert_eq!(reconciler.history("D1").len(), 1);

        let mut streamed = sample("D1", Some(2.0));
        streamed.battery_pct = Some(39.0);
        reconciler.apply_stream(&streamed, 2_500);

        // Stream takes precedence and the seed is gone for good.
        assert_eq!(reconciler.live_view("D1", 3_000).unwrap().sample.battery_pct, Some(39.0));
        let history = reconciler.history("D1");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].time_ms, 2_000);

        reconciler.apply_polled(&polled, 3_500);
        assert_eq!(reconciler.live_view("D1", 4_000).unwrap().sample.battery_pct, Some(39.0));
    }

    #[test]
    fn history_is_bounded_and_ordered() {
        let mut reconciler = Reconciler::new(3, Duration::from_secs(10));
        for t in 0..6 {
            reconciler.apply_stream(&sample("D1", Some(t as f64)), 0);
        }
        let times: Vec<i64> = reconciler.history("D1").iter().map(|p| p.time_ms).collect();
        assert_eq!(times, vec![3_000, 4_000, 5_000]);
    }

    #[test]
    fn staleness_tracks_the_threshold() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));
        reconciler.apply_stream(&sample("D1", Some(100.0)), 100_000);

        // exactly at the threshold is not yet stale
        assert!(!reconciler.live_view("D1", 110_000).unwrap().stale);
        assert!(reconciler.live_view("D1", 110_001).unwrap().stale);
    }

    #[test]
    fn sample_without_any_timestamp_is_stale() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));
        reconciler.apply_stream(&sample("D1", None), 5_000);
        let view = reconciler.live_view("D1", 5_001).unwrap();
        assert!(view.stale);
        assert_eq!(view.last_update_ms, None);
    }

    #[test]
    fn receipt_time_backs_up_event_time() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));
        let mut s = sample("D1", None);
        s.received_ts = Some(50.0);
        reconciler.apply_stream(&s, 51_000);
        let view = reconciler.live_view("D1", 55_000).unwrap();
        assert_eq!(view.last_update_ms, Some(50_000));
        assert!(!view.stale);
    }

    #[test]
    fn zero_battery_from_poll_is_displayed() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));
        let mut polled = sample("D1", Some(1.0));
        polled.battery_pct = Some(0.0);
        reconciler.apply_polled(&polled, 1_000);
        let view = reconciler.live_view("D1", 1_500).unwrap();
        assert_eq!(view.sample.battery_pct, Some(0.0));
    }

    #[test]
    fn state_is_kept_per_drone() {
        let mut reconciler = Reconciler::new(120, Duration::from_secs(10));
        reconciler.apply_stream(&sample("D1", Some(1.0)), 1_000);
        reconciler.apply_stream(&sample("D2", Some(2.0)), 2_000);
        assert!(reconciler.live_view("D1", 2_000).is_some());
        assert!(reconciler.live_view("D2", 2_000).is_some());
        assert!(reconciler.live_view("D3", 2_000).is_none());
    }
}
