//! Translation of fetcher status callbacks into progress events.

use std::sync::{Arc, OnceLock};

use crate::events::{ProgressEvent, ProgressStatus};
use crate::job::JobId;
use crate::ports::{FetchStatus, ProgressEmitter};

/// Percentage of `downloaded` over `total`, clamped to `[0, 100]` and rounded
/// to two decimals.
///
/// Returns `None` when the total is unknown or zero.
#[allow(clippy::cast_precision_loss)]
pub fn percent_complete(downloaded: u64, total: Option<u64>) -> Option<f64> {
    let total = total.filter(|t| *t > 0)?;
    let percent = (downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
    Some((percent * 100.0).round() / 100.0)
}

/// Republishes one job's fetcher callbacks onto an emitter.
///
/// Guarantees at most one terminal event per job: once [`Self::finish`] or
/// [`Self::fail`] has published, later calls are ignored.
pub(crate) struct ProgressRelay {
    job_id: JobId,
    emitter: Arc<dyn ProgressEmitter>,
    terminal: OnceLock<ProgressStatus>,
}

impl ProgressRelay {
    pub(crate) fn new(job_id: JobId, emitter: Arc<dyn ProgressEmitter>) -> Self {
        Self {
            job_id,
            emitter,
            terminal: OnceLock::new(),
        }
    }

    /// Handle one status callback from the fetcher.
    pub(crate) fn on_status(&self, status: FetchStatus, completed_message: &str) {
        if self.is_terminated() {
            return;
        }
        match status {
            FetchStatus::Downloading { downloaded, total } => {
                let event = percent_complete(downloaded, total).map_or_else(
                    || ProgressEvent::indeterminate(self.job_id),
                    |percent| ProgressEvent::downloading(self.job_id, percent),
                );
                self.emitter.emit(event);
            }
            FetchStatus::Finished => {
                self.finish(completed_message);
            }
        }
    }

    /// Publish the terminal `completed` event. Returns `false` if the job
    /// already terminated.
    pub(crate) fn finish(&self, message: &str) -> bool {
        if self.terminal.set(ProgressStatus::Completed).is_err() {
            return false;
        }
        self.emitter.emit(ProgressEvent::completed(self.job_id, message));
        true
    }

    /// Publish the terminal `error` event. Returns `false` if the job already
    /// terminated.
    pub(crate) fn fail(&self, message: &str) -> bool {
        if self.terminal.set(ProgressStatus::Error).is_err() {
            return false;
        }
        self.emitter.emit(ProgressEvent::error(self.job_id, message));
        true
    }

    /// Status of the terminal event already published, if any.
    pub(crate) fn terminal_status(&self) -> Option<ProgressStatus> {
        self.terminal.get().copied()
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminal.get().is_some()
    }
}
