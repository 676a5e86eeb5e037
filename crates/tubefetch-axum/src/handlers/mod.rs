//! HTTP request handlers.
//!
//! Handlers stay thin: they extract input, call into the job runner or the
//! progress bus, and map results onto HTTP responses.

pub mod downloads;
pub mod pages;
pub mod progress;

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
