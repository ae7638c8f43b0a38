use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream that emits a `layer` event for every layer
/// shown or hidden.
///
/// A subscriber that falls behind the channel gets a `resync` event carrying
/// the number of skipped layer events; the page answers it by refetching
/// `/api/scene`.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.canvas.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(event) => Event::default()
            .event("layer")
            .json_data(&event)
            .ok()
            .map(Ok::<Event, Infallible>),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "layer subscriber lagged, requesting resync");
            Some(Ok(Event::default()
                .event("resync")
                .data(skipped.to_string())))
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
