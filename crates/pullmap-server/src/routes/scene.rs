use axum::extract::State;
use axum::Json;
use pullmap_core::canvas::Layer;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/scene: layers currently visible, in creation order.
pub async fn get_scene(State(app): State<AppState>) -> Result<Json<Vec<Layer>>, AppError> {
    Ok(Json(app.canvas.snapshot()?))
}
