//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::bootstrap::AppContext;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// Unknown paths, and known paths hit with an unsupported method, answer
/// 404 `Page not found`. Everything under `/static` that is not a servable
/// file answers 404 `File not found`.
pub fn create_router(ctx: AppContext) -> Router {
    let static_files = handlers::pages::static_files(&ctx.static_dir);
    let state: AppState = Arc::new(ctx);
    let not_found = handlers::pages::not_found;

    Router::new()
        .route("/", get(handlers::pages::index).fallback(not_found))
        .nest_service("/static", static_files)
        .route(
            "/download",
            post(handlers::downloads::submit).fallback(not_found),
        )
        .route(
            "/progress",
            get(handlers::progress::stream).fallback(not_found),
        )
        .route("/health", get(handlers::health).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
