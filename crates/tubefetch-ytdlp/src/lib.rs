//! yt-dlp adapter for tubefetch.
//!
//! Runs the `yt-dlp` executable as a child process and translates its
//! machine-readable progress lines into [`tubefetch_core::FetchStatus`]
//! callbacks.

mod fetcher;
mod protocol;

pub use fetcher::{DEFAULT_PROGRAM, YtDlpFetcher};
pub use protocol::{LINE_PREFIX, ProtocolError, parse_line, progress_template};
