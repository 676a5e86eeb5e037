//! Progress stream handler.

use axum::extract::State;
use axum::response::IntoResponse;

use crate::sse::progress_stream;
use crate::state::AppState;

/// GET /progress - stream job progress as Server-Sent Events.
pub async fn stream(State(state): State<AppState>) -> impl IntoResponse {
    progress_stream(&state.bus)
}
