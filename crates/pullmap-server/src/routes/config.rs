use axum::extract::State;
use axum::Json;
use pullmap_core::config::MapView;
use pullmap_core::types::{DistanceUnit, Targets};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct MapConfig {
    map: MapView,
    targets: Targets,
    distance_unit: DistanceUnit,
    interval_ms: u64,
}

/// GET /api/config: what the map page needs to set up its view.
pub async fn get_config(State(app): State<AppState>) -> Json<MapConfig> {
    let c = &app.config;
    Json(MapConfig {
        map: c.map.clone(),
        targets: c.targets,
        distance_unit: c.distance_unit,
        interval_ms: c.playback.interval_ms,
    })
}
