use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the fleet gateway REST API.
    pub base_url: String,
    /// WebSocket URL template with an `{id}` placeholder.
    pub stream_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Tuning for the live-telemetry core. Durations are written in humantime
/// form ("10s", "1500ms").
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_stale_threshold", deserialize_with = "duration_str")]
    pub stale_threshold: Duration,
    #[serde(default = "default_base_delay", deserialize_with = "duration_str")]
    pub reconnect_base_delay: Duration,
    #[serde(default = "default_max_delay", deserialize_with = "duration_str")]
    pub reconnect_max_delay: Duration,
    #[serde(default = "default_poll_interval", deserialize_with = "duration_str")]
    pub poll_interval: Duration,
    #[serde(default = "default_snapshot_interval", deserialize_with = "duration_str")]
    pub snapshot_interval: Duration,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_track_point_cap")]
    pub track_point_cap: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            stale_threshold: default_stale_threshold(),
            reconnect_base_delay: default_base_delay(),
            reconnect_max_delay: default_max_delay(),
            poll_interval: default_poll_interval(),
            snapshot_interval: default_snapshot_interval(),
            history_capacity: default_history_capacity(),
            track_point_cap: default_track_point_cap(),
        }
    }
}

impl LiveConfig {
    /// Tracks split on gaps above this; derived from the staleness
    /// threshold with a 20 s floor.
    pub fn segment_gap(&self) -> Duration {
        self.stale_threshold.max(Duration::from_secs(20))
    }
}

fn default_stale_threshold() -> Duration {
    Duration::from_secs(10)
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_snapshot_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_history_capacity() -> usize {
    120
}

fn default_track_point_cap() -> usize {
    800
}

fn duration_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_sections_are_omitted() {
        let yaml = r#"
upstream:
  base_url: "http://gw.local:9000/api"
  stream_url: "ws://gw.local:9000/api/drones/{id}/stream"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.live.stale_threshold, Duration::from_secs(10));
        assert_eq!(config.live.reconnect_base_delay, Duration::from_secs(1));
        assert_eq!(config.live.reconnect_max_delay, Duration::from_secs(10));
        assert_eq!(config.live.history_capacity, 120);
        assert_eq!(config.live.track_point_cap, 800);
        assert_eq!(config.live.segment_gap(), Duration::from_secs(20));
    }

    #[test]
    fn humantime_durations_parse() {
        let yaml = r#"
upstream:
  base_url: "http://gw.local:9000/api"
  stream_url: "ws://gw.local:9000/api/drones/{id}/stream"
live:
  stale_threshold: 30s
  reconnect_base_delay: 500ms
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.live.stale_threshold, Duration::from_secs(30));
        assert_eq!(config.live.reconnect_base_delay, Duration::from_millis(500));
        // a 30s stale threshold lifts the gap above the 20s floor
        assert_eq!(config.live.segment_gap(), Duration::from_secs(30));
    }
}
