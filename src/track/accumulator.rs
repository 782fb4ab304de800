use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use utoipa::ToSchema;

use super::color::color_for;
use crate::fleet::DroneStatus;
use crate::telemetry::TelemetrySample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    /// Event time, Unix seconds.
    #[serde(rename = "t")]
    pub time_s: f64,
}

/// A maximal run of chronological points with no gap over the threshold.
#[derive(Debug, Default)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

struct EntityTrack {
    segments: Vec<TrackSegment>,
    total_points: usize,
    color: &'static str,
    status: DroneStatus,
}

impl EntityTrack {
    fn new(drone_id: &str) -> Self {
        EntityTrack {
            segments: Vec::new(),
            total_points: 0,
            color: color_for(drone_id),
            status: DroneStatus::Offline,
        }
    }

    fn last_point(&self) -> Option<TrackPoint> {
        self.segments.last().and_then(|s| s.points.last()).copied()
    }

    /// Drop the earliest points of the earliest segment until under the cap,
    /// removing segments that empty out.
    fn trim_to(&mut self, cap: usize) {
        while self.total_points > cap {
            let overflow = self.total_points - cap;
            let Some(first) = self.segments.first_mut() else {
                break;
            };
            let take = overflow.min(first.points.len());
            first.points.drain(0..take);
            self.total_points -= take;
            if first.points.is_empty() {
                self.segments.remove(0);
            }
        }
    }
}

/// Renderable snapshot of one drone's track.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackView {
    pub drone_id: String,
    pub color: String,
    pub status: DroneStatus,
    pub total_points: usize,
    pub segments: Vec<Vec<TrackPoint>>,
}

/// Folds position samples into per-drone polyline segments with bounded
/// memory. Segments split where the inter-sample gap exceeds the threshold,
/// so tracks render as disjoint lines across connectivity gaps.
pub struct TrackAccumulator {
    segment_gap_s: f64,
    point_cap: usize,
    entities: HashMap<String, EntityTrack>,
}

impl TrackAccumulator {
    pub fn new(segment_gap: Duration, point_cap: usize) -> Self {
        TrackAccumulator {
            segment_gap_s: segment_gap.as_secs_f64(),
            point_cap,
            entities: HashMap::new(),
        }
    }

    pub fn record(&mut self, sample: &TelemetrySample, now_s: f64) {
        let Some((lat, lon)) = sample.position() else {
            return;
        };
        let time_s = sample.event_ts.or(sample.received_ts).unwrap_or(now_s);
        let point = TrackPoint { lat, lon, time_s };

        let entry = self
            .entities
            .entry(sample.drone_id.clone())
            .or_insert_with(|| EntityTrack::new(&sample.drone_id));

        // Idempotent under duplicate delivery.
        if entry.last_point() == Some(point) {
            return;
        }

        let start_new = match entry.last_point() {
            None => true,
            Some(last) => (point.time_s - last.time_s).abs() > self.segment_gap_s,
        };
        if start_new {
            entry.segments.push(TrackSegment::default());
        }
        if let Some(segment) = entry.segments.last_mut() {
            segment.points.push(point);
            entry.total_points += 1;
        }
        entry.trim_to(self.point_cap);
    }

    /// Mirror the fleet snapshot's classification onto the track metadata.
    pub fn set_status(&mut self, drone_id: &str, status: DroneStatus) {
        let entry = self
            .entities
            .entry(drone_id.to_string())
            .or_insert_with(|| EntityTrack::new(drone_id));
        entry.status = status;
    }

    pub fn view(&self, drone_id: &str) -> Option<TrackView> {
        self.entities.get(drone_id).map(|entry| TrackView {
            drone_id: drone_id.to_string(),
            color: entry.color.to_string(),
            status: entry.status,
            total_points: entry.total_points,
            segments: entry
                .segments
                .iter()
                .map(|s| s.points.clone())
                .collect(),
        })
    }

    pub fn views(&self) -> Vec<TrackView> {
        let mut ids: Vec<&String> = self.entities.keys().collect();
        ids.sort();
        ids.iter().filter_map(|id| self.view(id)).collect()
    }
}
