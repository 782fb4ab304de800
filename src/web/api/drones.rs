use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::live::HistoryPoint;
use crate::stream::ConnectionStatus;
use crate::telemetry::TelemetrySample;
use crate::track::{simplify_segment, TrackView};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

/// Reconciled live view of one drone.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveResponse {
    pub drone_id: String,
    /// Current sample; a stream sample takes precedence over a polled one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<TelemetrySample>,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionStatus>,
}

#[utoipa::path(
    get,
    path = "/api/drones/{id}/live",
    params(("id" = String, Path, description = "Drone id")),
    responses(
        (status = 200, description = "Live view for the drone", body = LiveResponse),
        (status = 404, description = "Unknown drone", body = ErrorResponse)
    ),
    tag = "drones"
)]
pub async fn live(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LiveResponse>> {
    let now_ms = Utc::now().timestamp_millis();
    let connection = state.manager.status(&id);
    let view = state.hub.live_view(&id, now_ms);
    if view.is_none() && connection.is_none() {
        return Err(ApiError::NotFound);
    }
    // A tracked drone with no data yet is not an error; its fields stay
    // unknown and it reads as stale.
    let (sample, stale, last_update_ms) = match view {
        Some(v) => (Some(v.sample), v.stale, v.last_update_ms),
        None => (None, true, None),
    };
    Ok(Json(LiveResponse {
        drone_id: id,
        sample,
        stale,
        last_update_ms,
        connection,
    }))
}

#[utoipa::path(
    get,
    path = "/api/drones/{id}/history",
    params(("id" = String, Path, description = "Drone id")),
    responses(
        (status = 200, description = "Bounded altitude/battery history", body = Vec<HistoryPoint>)
    ),
    tag = "drones"
)]
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<HistoryPoint>> {
    Json(state.hub.history(&id))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackQuery {
    /// Decimate each segment to at most this many points.
    pub max_points: Option<usize>,
    /// Drop adjacent points closer than this, in degrees.
    pub min_delta: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/drones/{id}/track",
    params(("id" = String, Path, description = "Drone id"), TrackQuery),
    responses(
        (status = 200, description = "Track segments for the drone", body = TrackView),
        (status = 404, description = "Unknown drone", body = ErrorResponse)
    ),
    tag = "drones"
)]
pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Json<TrackView>> {
    let mut view = state.hub.track(&id).ok_or(ApiError::NotFound)?;
    apply_simplification(&mut view, &query);
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/tracks",
    params(TrackQuery),
    responses(
        (status = 200, description = "All drones' tracks for the map view", body = Vec<TrackView>)
    ),
    tag = "drones"
)]
pub async fn tracks(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Json<Vec<TrackView>> {
    let mut views = state.hub.all_tracks();
    for view in &mut views {
        apply_simplification(view, &query);
    }
    Json(views)
}

fn apply_simplification(view: &mut TrackView, query: &TrackQuery) {
    if query.max_points.is_none() && query.min_delta.is_none() {
        return;
    }
    let min_delta = query.min_delta.unwrap_or(0.0);
    let max_points = query.max_points.unwrap_or(usize::MAX);
    let simplified = view
        .segments
        .iter()
        .map(|segment| simplify_segment(segment, min_delta, max_points))
        .collect();
    view.segments = simplified;
}
