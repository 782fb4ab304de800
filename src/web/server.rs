use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::fleet::{self, FleetApi, FleetStore};
use crate::live::{HubSettings, LiveHub};
use crate::stream::{StreamConfig, StreamManager, StreamSource, WsStreamSource};

use super::api::drones as drone_handlers;
use super::api::fleet as fleet_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::ui::handlers as ui_handlers;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<LiveHub>,
    pub manager: Arc<StreamManager>,
    pub store: Arc<FleetStore>,
    pub client: Arc<FleetApi>,
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let hub = Arc::new(LiveHub::new(&HubSettings {
        stale_threshold: config.live.stale_threshold,
        history_capacity: config.live.history_capacity,
        segment_gap: config.live.segment_gap(),
        track_point_cap: config.live.track_point_cap,
    }));
    let source: Arc<dyn StreamSource> =
        Arc::new(WsStreamSource::new(config.upstream.stream_url.clone()));
    let manager = Arc::new(StreamManager::new(
        StreamConfig {
            base_delay: config.live.reconnect_base_delay,
            max_delay: config.live.reconnect_max_delay,
        },
        source,
        Arc::clone(&hub),
    ));
    let client = Arc::new(FleetApi::new(&config.upstream.base_url));
    let store = Arc::new(FleetStore::new());

    fleet::spawn_pollers(
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&hub),
        Arc::clone(&manager),
        config.live.snapshot_interval,
        config.live.poll_interval,
    );

    let manager_handle = Arc::clone(&manager);
    let state = AppState {
        hub,
        manager,
        store,
        client,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        .route("/drones/{id}", get(ui_handlers::drone_detail))
        // Fleet API endpoints
        .route("/api/fleet", get(fleet_handlers::fleet_snapshot))
        .route("/api/health", get(fleet_handlers::health))
        // Per-drone API endpoints
        .route("/api/tracks", get(drone_handlers::tracks))
        .route("/api/drones/{id}/live", get(drone_handlers::live))
        .route("/api/drones/{id}/history", get(drone_handlers::history))
        .route("/api/drones/{id}/track", get(drone_handlers::track))
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let result = axum::serve(listener, app).await;
    manager_handle.shutdown();
    result
}
