//! Progress events pushed to observers.
//!
//! # Wire Format
//!
//! Events serialize with a `status` tag and only the fields that status
//! carries, matching what the browser client parses:
//!
//! ```json
//! {"status": "downloading", "progress": 42.17}
//! {"status": "downloading"}
//! {"status": "completed", "message": "Download complete. Saved to ..."}
//! {"status": "error", "message": "ERROR: Unsupported URL"}
//! ```
//!
//! The emitting job id travels with the event in-process (for logging and
//! per-job filtering) but is not part of the wire format.

use serde::Serialize;

use crate::job::JobId;

/// Status tag carried by every [`ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Bytes are still arriving.
    Downloading,
    /// Terminal: the media was fetched successfully.
    Completed,
    /// Terminal: the job failed and was abandoned.
    Error,
}

impl ProgressStatus {
    /// Whether no further events follow this status for the same job.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Immutable snapshot of a job's status at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Job that produced this event.
    #[serde(skip)]
    pub job_id: Option<JobId>,
    /// Status tag.
    pub status: ProgressStatus,
    /// Percentage in `[0, 100]`, rounded to two decimals. Absent when the
    /// total size is unknown or the status is terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Human-readable message for terminal events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    /// Create a `downloading` event with a known percentage.
    pub const fn downloading(job_id: JobId, progress: f64) -> Self {
        Self {
            job_id: Some(job_id),
            status: ProgressStatus::Downloading,
            progress: Some(progress),
            message: None,
        }
    }

    /// Create a `downloading` event for a fetch whose total size is unknown.
    pub const fn indeterminate(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            status: ProgressStatus::Downloading,
            progress: None,
            message: None,
        }
    }

    /// Create a terminal `completed` event.
    pub fn completed(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id),
            status: ProgressStatus::Completed,
            progress: None,
            message: Some(message.into()),
        }
    }

    /// Create a terminal `error` event.
    pub fn error(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id),
            status: ProgressStatus::Error,
            progress: None,
            message: Some(message.into()),
        }
    }

    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Serialize to the JSON body of an event-stream frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
