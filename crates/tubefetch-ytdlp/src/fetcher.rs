//! yt-dlp subprocess fetcher.
//!
//! Spawns yt-dlp for one request, streams its stdout through
//! [`parse_line`] into the status callback and maps the exit status onto
//! [`FetchError`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};
use tubefetch_core::{FetchError, FetchRequest, MediaFetcher, StatusCallback};

use crate::protocol::{ProtocolError, parse_line, progress_template};

/// Executable name looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// [`MediaFetcher`] backed by the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
}

impl YtDlpFetcher {
    /// Use `program` as-is, without checking that it exists.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the executable: `explicit` if given (a path or a name on
    /// `PATH`), otherwise `yt-dlp` on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, FetchError> {
        let candidate = explicit.unwrap_or_else(|| Path::new(DEFAULT_PROGRAM));
        if explicit.is_some() && candidate.is_file() {
            return Ok(Self::new(candidate));
        }

        let program = which::which(candidate).map_err(|e| {
            FetchError::NotInstalled(format!("{} ({e})", candidate.display()))
        })?;
        info!(
            target: "tubefetch.ytdlp",
            program = %program.display(),
            "Located yt-dlp"
        );
        Ok(Self::new(program))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, request: &FetchRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-f")
            .arg(request.format.as_str())
            .arg("--no-playlist")
            .arg("--newline")
            .arg("--progress-template")
            .arg(progress_template())
            .arg("-o")
            .arg(&request.output_template)
            .arg("--")
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: &io::Error) -> FetchError {
        if err.kind() == io::ErrorKind::NotFound {
            FetchError::NotInstalled(self.program.display().to_string())
        } else {
            FetchError::Spawn(err.to_string())
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        on_status: &StatusCallback<'_>,
    ) -> Result<(), FetchError> {
        let mut child = self
            .command(request)
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Io("Missing stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::Io("Missing stderr".to_string()))?;

        let stderr_task = tokio::spawn(last_error_line(stderr));

        let mut stdout = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = read_line_lossy(&mut stdout, &mut buf)
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?
        {
            match parse_line(&line) {
                Ok(status) => on_status(status),
                Err(ProtocolError::NotProgress) => {
                    if !line.trim().is_empty() {
                        debug!(target: "tubefetch.ytdlp", "{}", line.trim());
                    }
                }
                Err(e) => debug!(target: "tubefetch.ytdlp", error = %e, line, "Unparsed progress line"),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;
        let error_line = stderr_task.await.ok().flatten();

        check_exit(status, error_line)
    }
}

fn check_exit(status: ExitStatus, error_line: Option<String>) -> Result<(), FetchError> {
    if status.success() {
        return Ok(());
    }
    let reason = error_line.unwrap_or_else(|| format!("yt-dlp exited with {status}"));
    Err(FetchError::Failed(reason))
}

/// Read one line, replacing invalid UTF-8 with U+FFFD. `None` at EOF.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Drain stderr to EOF, returning the last `ERROR:` line, or the last
/// non-empty line when yt-dlp printed none.
async fn last_error_line<R>(stderr: R) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut last_error = None;
    let mut last_line = None;

    loop {
        let line = match read_line_lossy(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!(target: "tubefetch.ytdlp", error = %e, "stderr read failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(target: "tubefetch.ytdlp", stderr = line);
        if line.starts_with("ERROR:") {
            last_error = Some(line.to_string());
        }
        last_line = Some(line.to_string());
    }

    last_error.or(last_line)
}
