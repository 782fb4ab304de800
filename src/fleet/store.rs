use serde::Serialize;
use std::sync::Mutex as StdMutex;
use utoipa::ToSchema;

use super::types::EntitySummary;

/// Latest wholesale fleet snapshot plus the query-level error flag. A failed
/// fetch keeps the previous list so the UI can show stale data beside the
/// error.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct FleetSnapshot {
    pub drones: Vec<EntitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct FleetStore {
    inner: StdMutex<FleetSnapshot>,
}

impl FleetStore {
    pub fn new() -> Self {
        FleetStore {
            inner: StdMutex::new(FleetSnapshot::default()),
        }
    }

    pub fn update(&self, drones: Vec<EntitySummary>, now_ms: i64) {
        let mut snap = self.inner.lock().unwrap();
        snap.drones = drones;
        snap.fetched_at_ms = Some(now_ms);
        snap.error = None;
    }

    pub fn record_error(&self, message: String) {
        self.inner.lock().unwrap().error = Some(message);
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        self.inner.lock().unwrap().clone()
    }
}

impl Default for FleetStore {
    fn default() -> Self {
        FleetStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> EntitySummary {
        EntitySummary {
            drone_id: id.to_string(),
            status: Some("online".to_string()),
            last_seen: None,
            battery_pct: None,
            mode: None,
            lat: None,
            lon: None,
            gps_fix: None,
            emergency: None,
        }
    }

    #[test]
    fn update_replaces_wholesale_and_clears_the_error() {
        let store = FleetStore::new();
        store.record_error("boom".into());
        store.update(vec![summary("D1"), summary("D2")], 1_000);

        let snap = store.snapshot();
        assert_eq!(snap.drones.len(), 2);
        assert_eq!(snap.fetched_at_ms, Some(1_000));
        assert_eq!(snap.error, None);

        store.update(vec![summary("D3")], 2_000);
        let snap = store.snapshot();
        assert_eq!(snap.drones.len(), 1);
        assert_eq!(snap.drones[0].drone_id, "D3");
    }

    #[test]
    fn errors_keep_the_previous_list() {
        let store = FleetStore::new();
        store.update(vec![summary("D1")], 1_000);
        store.record_error("gateway timeout".into());

        let snap = store.snapshot();
        assert_eq!(snap.drones.len(), 1);
        assert_eq!(snap.error.as_deref(), Some("gateway timeout"));
    }
}
