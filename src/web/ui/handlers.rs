use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::web::server::AppState;

use super::templates::{DashboardTemplate, DroneTemplate};

pub async fn dashboard(State(_state): State<AppState>) -> impl IntoResponse {
    DashboardTemplate {}
}

pub async fn drone_detail(
    State(_state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    DroneTemplate { drone_id: id }
}
