use axum::extract::State;
use axum::Json;
use pullmap_core::proximity::DirectionalDistances;
use pullmap_core::types::{LatLng, Puller};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClassifyBody {
    origin: LatLng,
    destination: LatLng,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    forward: bool,
    unit: &'static str,
    distances: DirectionalDistances,
}

/// POST /api/classify: run the directional filter on one trip against the
/// configured targets.
pub async fn classify(
    State(app): State<AppState>,
    Json(body): Json<ClassifyBody>,
) -> Result<Json<ClassifyResponse>, AppError> {
    body.origin.validate()?;
    body.destination.validate()?;
    let trip = Puller::new("request", body.origin, body.destination);
    let unit = app.config.distance_unit;
    let distances = DirectionalDistances::measure(&trip, &app.config.targets, unit);
    Ok(Json(ClassifyResponse {
        forward: distances.is_forward(),
        unit: unit.as_str(),
        distances,
    }))
}
