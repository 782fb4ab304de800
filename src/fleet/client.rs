use serde_json::Value;
use thiserror::Error;

use super::types::{EntitySummary, HealthReport};

#[derive(Debug, Error)]
pub enum FleetApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// REST client for the upstream fleet gateway.
pub struct FleetApi {
    http: reqwest::Client,
    base_url: String,
}

impl FleetApi {
    pub fn new(base_url: &str) -> Self {
        FleetApi {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Point-in-time summary of the whole fleet.
    pub async fn fetch_snapshot(&self) -> Result<Vec<EntitySummary>, FleetApiError> {
        let url = format!("{}/fleet", self.base_url);
        let summaries = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(summaries)
    }

    pub async fn fetch_health(&self) -> Result<HealthReport, FleetApiError> {
        let url = format!("{}/health", self.base_url);
        let report = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(report)
    }

    /// Latest raw telemetry payload for one drone; shape is only known to
    /// the normalizer.
    pub async fn fetch_latest(&self, drone_id: &str) -> Result<Value, FleetApiError> {
        let url = format!("{}/drones/{}/latest", self.base_url, drone_id);
        let payload = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(payload)
    }
}
