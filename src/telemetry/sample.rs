use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One normalized telemetry reading. Every field except the drone id is
/// optional: absence means "unknown", never a default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TelemetrySample {
    #[serde(rename = "id", alias = "drone_id")]
    pub drone_id: String,
    /// Producer-assigned event timestamp, Unix seconds.
    #[serde(rename = "ts", skip_serializing_if = "Option::is_none")]
    pub event_ts: Option<f64>,
    /// Receipt timestamp, Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_ts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Altitude, meters.
    #[serde(rename = "alt", skip_serializing_if = "Option::is_none")]
    pub alt_m: Option<f64>,
    /// Battery percentage, 0-100.
    #[serde(rename = "battery", skip_serializing_if = "Option::is_none")]
    pub battery_pct: Option<f64>,
    /// Flight mode label, free text.
    #[serde(rename = "mode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Heading, degrees 0-360.
    #[serde(rename = "heading", skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
    /// Ground speed, m/s.
    #[serde(rename = "speed", skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    /// Climb rate, m/s, signed.
    #[serde(rename = "climb", skip_serializing_if = "Option::is_none")]
    pub climb_mps: Option<f64>,
    /// Tri-state GPS fix: None = unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_fix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency: Option<bool>,
}

impl TelemetrySample {
    pub fn empty(drone_id: &str) -> Self {
        TelemetrySample {
            drone_id: drone_id.to_string(),
            event_ts: None,
            received_ts: None,
            lat: None,
            lon: None,
            alt_m: None,
            battery_pct: None,
            mode: None,
            heading_deg: None,
            speed_mps: None,
            climb_mps: None,
            gps_fix: None,
            emergency: None,
        }
    }

    /// Best known update time in milliseconds: event time, else receipt time.
    pub fn update_time_ms(&self) -> Option<i64> {
        self.event_ts
            .or(self.received_ts)
            .map(|s| (s * 1000.0) as i64)
    }

    /// Position, only when both coordinates are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
