use axum::{extract::State, Json};

use crate::fleet::{FleetSnapshot, HealthReport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/fleet",
    responses(
        (status = 200, description = "Latest fleet snapshot with fetch metadata", body = FleetSnapshot)
    ),
    tag = "fleet"
)]
pub async fn fleet_snapshot(State(state): State<AppState>) -> Json<FleetSnapshot> {
    Json(state.store.snapshot())
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Upstream health", body = HealthReport),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse)
    ),
    tag = "fleet"
)]
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthReport>> {
    let report = state
        .client
        .fetch_health()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(report))
}
