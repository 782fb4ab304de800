use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification derived from the snapshot's status label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DroneStatus {
    Online,
    Stale,
    Offline,
}

impl DroneStatus {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(s) if s.eq_ignore_ascii_case("online") => DroneStatus::Online,
            Some(s) if s.eq_ignore_ascii_case("stale") => DroneStatus::Stale,
            _ => DroneStatus::Offline,
        }
    }

    /// Offline drones get no stream connection.
    pub fn is_active(self) -> bool {
        self != DroneStatus::Offline
    }
}

/// Wholesale per-drone summary from the fleet snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntitySummary {
    #[serde(rename = "id", alias = "drone_id")]
    pub drone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<f64>,
    #[serde(rename = "battery", skip_serializing_if = "Option::is_none")]
    pub battery_pct: Option<f64>,
    #[serde(rename = "mode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_fix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency: Option<bool>,
}

/// Upstream health probe result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_classify_as_offline() {
        assert_eq!(DroneStatus::from_label(Some("online")), DroneStatus::Online);
        assert_eq!(DroneStatus::from_label(Some("ONLINE")), DroneStatus::Online);
        assert_eq!(DroneStatus::from_label(Some("stale")), DroneStatus::Stale);
        assert_eq!(DroneStatus::from_label(Some("lost")), DroneStatus::Offline);
        assert_eq!(DroneStatus::from_label(None), DroneStatus::Offline);
    }

    #[test]
    fn only_offline_is_inactive() {
        assert!(DroneStatus::Online.is_active());
        assert!(DroneStatus::Stale.is_active());
        assert!(!DroneStatus::Offline.is_active());
    }
}
