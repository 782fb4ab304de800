use serde_json::{Map, Value};

use super::sample::TelemetrySample;

/// Envelope keys that may wrap a telemetry object one level deep.
const ENVELOPE_KEYS: [&str; 3] = ["data", "payload", "telemetry"];

/// Convert a raw wire payload of unknown shape into a canonical sample.
///
/// Returns None for payloads that are not objects or carry no recognizable
/// drone identity; callers drop those messages without surfacing an error.
pub fn normalize(raw: &Value) -> Option<TelemetrySample> {
    let obj = raw.as_object()?;

    if looks_canonical(obj) {
        return from_canonical(raw, obj);
    }

    for key in ENVELOPE_KEYS {
        if let Some(inner) = obj.get(key) {
            if let Some(inner_obj) = inner.as_object() {
                return if looks_canonical(inner_obj) {
                    from_canonical(inner, inner_obj)
                } else {
                    from_legacy(inner_obj)
                };
            }
        }
    }

    from_legacy(obj)
}

/// A payload is canonical when it exposes an id plus at least one
/// top-level position or flight-mode field.
fn looks_canonical(obj: &Map<String, Value>) -> bool {
    let has_id = obj.get("id").map_or(false, Value::is_string)
        || obj.get("drone_id").map_or(false, Value::is_string);
    has_id
        && (obj.contains_key("lat") || obj.contains_key("lon") || obj.contains_key("mode"))
}

fn from_canonical(value: &Value, obj: &Map<String, Value>) -> Option<TelemetrySample> {
    let mut sample: TelemetrySample = serde_json::from_value(value.clone()).ok()?;
    // Older producers put a single last-seen stamp beside canonical fields.
    if sample.event_ts.is_none() {
        sample.event_ts = number(obj, "last_seen");
    }
    if sample.received_ts.is_none() {
        sample.received_ts = number(obj, "last_seen");
    }
    Some(sample)
}

/// Legacy nested layout: position/battery/flags/derived sub-objects keyed by
/// `drone_id`, with a single `last_seen` stamp standing in for both times.
fn from_legacy(obj: &Map<String, Value>) -> Option<TelemetrySample> {
    let drone_id = string(obj, "drone_id").or_else(|| string(obj, "id"))?;
    let last_seen = number(obj, "last_seen");

    let position = obj.get("position").and_then(Value::as_object);
    let battery = obj.get("battery").and_then(Value::as_object);
    let flags = obj.get("flags").and_then(Value::as_object);
    let derived = obj.get("derived").and_then(Value::as_object);

    let mut sample = TelemetrySample::empty(&drone_id);
    sample.event_ts = number(obj, "ts").or(last_seen);
    sample.received_ts = number(obj, "received_ts").or(last_seen);
    sample.lat = position.and_then(|p| number(p, "lat"));
    sample.lon = position.and_then(|p| number(p, "lon"));
    sample.alt_m = position.and_then(|p| number(p, "alt"));
    sample.battery_pct = battery.and_then(|b| number(b, "percent"));
    sample.heading_deg = derived.and_then(|d| number(d, "heading_deg"));
    sample.speed_mps = derived.and_then(|d| number(d, "speed_mps"));
    sample.climb_mps = derived.and_then(|d| number(d, "climb_mps"));
    // "gps lost" inverts to a fix flag; unknown stays unknown.
    sample.gps_fix = flags
        .and_then(|f| f.get("gps_lost"))
        .and_then(Value::as_bool)
        .map(|lost| !lost);
    sample.emergency = flags.and_then(|f| f.get("emergency")).and_then(Value::as_bool);
    Some(sample)
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}
