//! Port definitions (trait abstractions) for external systems.
//!
//! Adapters implement these traits; the job runner only ever sees the trait
//! objects, so tests can swap in scripted fetchers and recording emitters.

pub mod media_fetcher;
pub mod progress_emitter;

pub use media_fetcher::{
    FetchError, FetchRequest, FetchStatus, FormatSelector, MediaFetcher, StatusCallback,
};
pub use progress_emitter::{NoopEmitter, ProgressEmitter};

#[cfg(test)]
pub use progress_emitter::MockProgressEmitter;
