//! Index page, static assets and the not-found fallbacks.

use std::path::Path;

use axum::Router;
use axum::extract::{Request, State};
use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use tower_http::services::ServeDir;

use crate::error::{FILE_NOT_FOUND_MESSAGE, HttpError, PAGE_NOT_FOUND_MESSAGE};
use crate::state::AppState;

/// Name of the index page inside the templates directory.
pub const INDEX_FILE: &str = "index.html";

/// GET / - the submission page.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, HttpError> {
    let path = state.templates_dir.join(INDEX_FILE);
    tokio::fs::read_to_string(&path).await.map(Html).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read index page");
        HttpError::Internal(format!("Error loading HTML file: {e}"))
    })
}

/// Files below `dir`, mounted under `/static`.
///
/// Missing files, paths escaping `dir` and methods other than GET/HEAD answer
/// 404 `File not found`. Content types follow [`content_type_for`].
pub fn static_files(dir: &Path) -> Router {
    let files = ServeDir::new(dir)
        .append_index_html_on_directories(false)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(file_not_found.into_service());

    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn(static_content_type))
}

async fn file_not_found() -> HttpError {
    HttpError::NotFound(FILE_NOT_FOUND_MESSAGE.to_string())
}

async fn static_content_type(request: Request, next: Next) -> Response {
    let content_type = content_type_for(Path::new(request.uri().path()));
    let mut response = next.run(request).await;
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

/// Fallback for every unmatched route.
pub async fn not_found() -> HttpError {
    HttpError::NotFound(PAGE_NOT_FOUND_MESSAGE.to_string())
}

/// Content type served for a static file, chosen by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
