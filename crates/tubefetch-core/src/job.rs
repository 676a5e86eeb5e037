//! Download job model and lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Unique identifier for one download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a [`DownloadJob`].
///
/// `Pending -> Running -> Completed | Failed`. Terminal states accept no
/// further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed | Self::Failed)
                // Directory resolution can fail before the fetch starts
                | (Self::Pending, Self::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One user-initiated download attempt.
///
/// Owned by the task that executes it and dropped once its terminal event
/// has been published.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    id: JobId,
    url: String,
    output_template: Option<String>,
    state: JobState,
    created_at: DateTime<Utc>,
}

impl DownloadJob {
    /// Create a pending job for an already-validated URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            output_template: None,
            state: JobState::Pending,
            created_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Output path template, known once the destination directory resolved.
    pub fn output_template(&self) -> Option<&str> {
        self.output_template.as_deref()
    }

    pub fn set_output_template(&mut self, template: impl Into<String>) {
        self.output_template = Some(template.into());
    }

    pub const fn state(&self) -> JobState {
        self.state
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move to `next`, returning `false` (and leaving the state untouched)
    /// if the step is not a legal lifecycle transition.
    pub fn transition(&mut self, next: JobState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}
