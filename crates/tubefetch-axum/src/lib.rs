//! Axum web adapter for tubefetch.
//!
//! Serves the submission page and static assets, accepts download
//! submissions and streams job progress to browsers over Server-Sent Events.

#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings for crates only used by integration tests
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{
    AppContext, DEFAULT_HOST, DEFAULT_PORT, ServerConfig, bootstrap, serve, start_server,
};
pub use error::HttpError;
pub use routes::create_router;
pub use sse::progress_stream;
pub use state::AppState;
