use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pullmap_core::error::PullmapError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(PullmapError::InvalidCoordinate(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<PullmapError>() {
            Some(e) => match e {
                PullmapError::InvalidCoordinate(_) | PullmapError::InvalidConfig(_) => {
                    StatusCode::BAD_REQUEST
                }
                PullmapError::EmptyRoute(_) | PullmapError::EmptyHull => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                PullmapError::Http { .. } | PullmapError::Status { .. } => StatusCode::BAD_GATEWAY,
                PullmapError::Canvas(_)
                | PullmapError::Io(_)
                | PullmapError::Yaml(_)
                | PullmapError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
