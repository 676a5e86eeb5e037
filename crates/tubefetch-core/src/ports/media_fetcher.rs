//! Media fetcher port.
//!
//! The fetcher is the black-box engine that downloads a media URL to disk.
//! It reports status through a synchronous callback invoked from inside the
//! job's own task, and returns once the fetch has finished or failed.

use async_trait::async_trait;
use thiserror::Error;

/// Format selection policy handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatSelector {
    /// Highest-quality single combined stream.
    #[default]
    Best,
}

impl FormatSelector {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
        }
    }
}

/// Everything the engine needs to run one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Source media URL.
    pub url: String,
    /// Output path template (`<dir>/%(title)s.%(ext)s`).
    pub output_template: String,
    /// Format selection policy.
    pub format: FormatSelector,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, output_template: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_template: output_template.into(),
            format: FormatSelector::Best,
        }
    }
}

/// Status reported by the engine while a fetch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Bytes are arriving. `total` is `None` when the engine cannot tell.
    Downloading { downloaded: u64, total: Option<u64> },
    /// The engine finished writing the media.
    Finished,
}

/// Callback receiving [`FetchStatus`] updates.
pub type StatusCallback<'a> = dyn Fn(FetchStatus) + Send + Sync + 'a;

/// Errors surfaced by a fetch. The display text is what observers see.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The engine ran and reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The engine executable could not be found.
    #[error("Downloader not installed: {0}")]
    NotInstalled(String),

    /// The engine could not be started.
    #[error("Failed to start downloader: {0}")]
    Spawn(String),

    /// I/O error while talking to the engine.
    #[error("I/O error: {0}")]
    Io(String),

    /// The fetch panicked inside the job task.
    #[error("Download task panicked: {0}")]
    Panicked(String),
}

/// Port for the external media download engine.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `request.url` into `request.output_template`, reporting
    /// progress through `on_status`.
    async fn fetch(
        &self,
        request: &FetchRequest,
        on_status: &StatusCallback<'_>,
    ) -> Result<(), FetchError>;
}
