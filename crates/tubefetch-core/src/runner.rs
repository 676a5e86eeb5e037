//! Job runner: validates submissions and executes downloads in the background.
//!
//! Each accepted submission becomes a [`DownloadJob`] executed on its own
//! tokio task. The task resolves the download directory, calls the
//! [`MediaFetcher`], republishes every status callback onto the
//! [`ProgressEmitter`] and always finishes with exactly one terminal event.
//! Failures (including panics inside the fetcher) stay inside the task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CoreError;
use crate::events::ProgressStatus;
use crate::job::{DownloadJob, JobId, JobState};
use crate::paths::{output_template, resolve_download_dir};
use crate::ports::{FetchError, FetchRequest, FetchStatus, MediaFetcher, ProgressEmitter};
use crate::progress::ProgressRelay;

/// Configuration for the job runner.
#[derive(Debug, Clone, Default)]
pub struct JobRunnerConfig {
    /// Directory downloads are written to. `None` resolves the platform
    /// default (`<home>/Downloads/YouTubeDownloads`) for every job.
    pub download_dir: Option<PathBuf>,
}

impl JobRunnerConfig {
    pub fn new(download_dir: Option<PathBuf>) -> Self {
        Self { download_dir }
    }
}

/// Validate a submitted URL, returning its trimmed form.
///
/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("URL cannot be empty".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| CoreError::InvalidInput(format!("Malformed URL '{trimmed}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::InvalidInput(format!(
                "Unsupported URL scheme '{other}'"
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(CoreError::InvalidInput(format!("URL '{trimmed}' has no host")));
    }

    Ok(trimmed.to_string())
}

/// Dispatches download jobs onto independent tasks.
///
/// Cloning is cheap; clones share the fetcher, emitter and configuration.
#[derive(Clone)]
pub struct JobRunner {
    fetcher: Arc<dyn MediaFetcher>,
    emitter: Arc<dyn ProgressEmitter>,
    config: Arc<JobRunnerConfig>,
}

impl JobRunner {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        emitter: Arc<dyn ProgressEmitter>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            fetcher,
            emitter,
            config: Arc::new(config),
        }
    }

    /// Accept `url` and start downloading it in the background.
    ///
    /// Returns as soon as the job task is spawned. Must be called from within
    /// a tokio runtime.
    pub fn submit(&self, url: &str) -> Result<JobHandle, CoreError> {
        let url = validate_url(url)?;
        let job = DownloadJob::new(url);
        let id = job.id();
        let (state_tx, state_rx) = watch::channel(job.state());

        info!(
            target: "tubefetch.job",
            job_id = %id,
            url = %job.url(),
            "Download job accepted"
        );

        let task = tokio::spawn(run_job(
            job,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.emitter),
            Arc::clone(&self.config),
            state_tx,
        ));

        Ok(JobHandle {
            id,
            state: state_rx,
            task,
        })
    }
}

/// Handle to a submitted job.
///
/// Dropping the handle detaches it; the job keeps running.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    state: watch::Receiver<JobState>,
    task: JoinHandle<JobState>,
}

impl JobHandle {
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Wait for the job to reach its terminal state.
    pub async fn wait(self) -> JobState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                warn!(job_id = %self.id, error = %e, "Job task aborted");
                JobState::Failed
            }
        }
    }
}

fn advance(job: &mut DownloadJob, next: JobState, state_tx: &watch::Sender<JobState>) {
    if job.transition(next) {
        state_tx.send_replace(next);
    } else {
        debug!(
            job_id = %job.id(),
            from = %job.state(),
            to = %next,
            "Ignoring illegal job transition"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Resolve and prepare the job's download directory on the blocking pool.
async fn prepare_download_dir(config: Arc<JobRunnerConfig>) -> Result<PathBuf, CoreError> {
    tokio::task::spawn_blocking(move || resolve_download_dir(config.download_dir.as_deref()))
        .await
        .map_err(|e| CoreError::FetchFailure(FetchError::Panicked(e.to_string())))?
        .map_err(CoreError::from)
}

async fn run_job(
    mut job: DownloadJob,
    fetcher: Arc<dyn MediaFetcher>,
    emitter: Arc<dyn ProgressEmitter>,
    config: Arc<JobRunnerConfig>,
    state_tx: watch::Sender<JobState>,
) -> JobState {
    let relay = ProgressRelay::new(job.id(), emitter);

    let dir = match prepare_download_dir(config).await {
        Ok(dir) => dir,
        Err(err) => {
            warn!(
                target: "tubefetch.job",
                job_id = %job.id(),
                error = %err,
                "Cannot resolve download directory"
            );
            relay.fail(&err.to_string());
            advance(&mut job, JobState::Failed, &state_tx);
            return job.state();
        }
    };

    let template = output_template(&dir);
    job.set_output_template(template.clone());
    advance(&mut job, JobState::Running, &state_tx);

    info!(
        target: "tubefetch.job",
        job_id = %job.id(),
        output_template = %template,
        "Download started"
    );

    let request = FetchRequest::new(job.url(), template);
    let completed_message = format!("Download complete. Saved to {}", dir.display());
    let on_status = |status: FetchStatus| relay.on_status(status, &completed_message);

    let result = match AssertUnwindSafe(fetcher.fetch(&request, &on_status))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(FetchError::Panicked(panic_message(payload.as_ref()))),
    };

    let elapsed_ms = (Utc::now() - job.created_at()).num_milliseconds();
    match result {
        Ok(()) => {
            relay.finish(&completed_message);
        }
        Err(e) => {
            let err = CoreError::from(e);
            if relay.fail(&err.to_string()) {
                warn!(
                    target: "tubefetch.job",
                    job_id = %job.id(),
                    error = %err,
                    elapsed_ms,
                    "Download failed"
                );
            } else {
                warn!(
                    target: "tubefetch.job",
                    job_id = %job.id(),
                    error = %err,
                    "Downloader reported an error after finishing; keeping completed state"
                );
            }
        }
    }

    let terminal = match relay.terminal_status() {
        Some(ProgressStatus::Completed) => JobState::Completed,
        _ => JobState::Failed,
    };
    advance(&mut job, terminal, &state_tx);

    if terminal == JobState::Completed {
        info!(
            target: "tubefetch.job",
            job_id = %job.id(),
            elapsed_ms,
            "Download completed"
        );
    }

    job.state()
}
