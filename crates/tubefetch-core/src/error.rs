//! Core error taxonomy.

use thiserror::Error;

use crate::paths::PathError;
use crate::ports::FetchError;

/// Errors surfaced by the job subsystem.
///
/// Only `InvalidInput` reaches a submitting caller; the other variants are
/// converted into a terminal `error` progress event inside the job task.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing, empty or malformed submitted URL.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The download directory cannot be resolved on this host.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Download directory exists but could not be prepared.
    #[error(transparent)]
    Path(PathError),

    /// The external fetch failed.
    #[error(transparent)]
    FetchFailure(#[from] FetchError),
}

impl From<PathError> for CoreError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::UnsupportedPlatform(os) => Self::UnsupportedPlatform(os),
            PathError::NoHomeDir => Self::UnsupportedPlatform(err.to_string()),
            other => Self::Path(other),
        }
    }
}
