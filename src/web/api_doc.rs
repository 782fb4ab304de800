use utoipa::OpenApi;

use super::api::drones::LiveResponse;
use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::fleet::fleet_snapshot,
        super::api::fleet::health,
        super::api::drones::live,
        super::api::drones::history,
        super::api::drones::track,
        super::api::drones::tracks,
    ),
    components(
        schemas(
            LiveResponse,
            ErrorResponse,
            crate::fleet::FleetSnapshot,
            crate::fleet::EntitySummary,
            crate::fleet::HealthReport,
            crate::fleet::DroneStatus,
            crate::telemetry::TelemetrySample,
            crate::live::HistoryPoint,
            crate::track::TrackPoint,
            crate::track::TrackView,
            crate::stream::ConnectionPhase,
            crate::stream::ConnectionStatus,
        )
    ),
    info(
        title = "Fleetwatch API",
        description = "Live drone fleet telemetry dashboard",
        version = "0.1.0"
    ),
    tags(
        (name = "fleet", description = "Fleet snapshot and upstream health"),
        (name = "drones", description = "Per-drone live telemetry, history and tracks")
    )
)]
pub struct ApiDoc;
