//! Core domain for tubefetch.
//!
//! Holds the download job model, the progress event union, the process-wide
//! [`ProgressBus`] and the [`JobRunner`] that executes downloads against a
//! [`MediaFetcher`] port. Transport adapters (Axum SSE, CLI) depend on this
//! crate; it depends on none of them.

pub mod bus;
pub mod error;
pub mod events;
pub mod job;
pub mod paths;
pub mod ports;
pub mod progress;
pub mod runner;

// Re-export commonly used types for convenience
pub use bus::{BusMessage, DEFAULT_BUS_CAPACITY, DEFAULT_IDLE_WINDOW, ProgressBus, Subscription};
pub use error::CoreError;
pub use events::{ProgressEvent, ProgressStatus};
pub use job::{DownloadJob, JobId, JobState};
pub use ports::{
    FetchError, FetchRequest, FetchStatus, FormatSelector, MediaFetcher, NoopEmitter,
    ProgressEmitter, StatusCallback,
};
pub use progress::percent_complete;
pub use runner::{JobHandle, JobRunner, JobRunnerConfig, validate_url};

// Re-export path utilities
pub use paths::{
    DOWNLOAD_SUBFOLDER, PathError, default_downloads_dir, ensure_download_dir,
    media_download_dir, output_template, resolve_download_dir,
};
