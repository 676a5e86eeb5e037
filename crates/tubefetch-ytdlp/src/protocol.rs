//! Progress line protocol between yt-dlp and the fetcher.
//!
//! yt-dlp is started with a `--progress-template` that prints one line per
//! progress hook call:
//!
//! ```text
//! tubefetch:downloading 1048576 5242880 NA
//! tubefetch:downloading 2097152 NA 5300000.0
//! tubefetch:finished 5242880 5242880 NA
//! ```
//!
//! Fields are status, downloaded bytes, total bytes and the estimated total.
//! yt-dlp prints `NA` for fields it does not know. Estimates may be floats.

use thiserror::Error;
use tubefetch_core::FetchStatus;

/// Marker every progress line starts with.
pub const LINE_PREFIX: &str = "tubefetch:";

/// Value of `--progress-template` producing lines [`parse_line`] understands.
pub fn progress_template() -> String {
    format!(
        "download:{LINE_PREFIX}%(progress.status)s %(progress.downloaded_bytes)s \
         %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
    )
}

/// Errors that can occur when parsing a progress line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Ordinary yt-dlp output, not a progress line.
    #[error("Not a progress line")]
    NotProgress,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid number in field {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    /// yt-dlp reported a hook status other than downloading/finished.
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

/// Parse a single stdout line into a [`FetchStatus`].
pub fn parse_line(line: &str) -> Result<FetchStatus, ProtocolError> {
    let body = line
        .trim()
        .strip_prefix(LINE_PREFIX)
        .ok_or(ProtocolError::NotProgress)?;

    let mut fields = body.split_whitespace();
    let status = fields.next().ok_or(ProtocolError::MissingField("status"))?;
    let downloaded = parse_bytes("downloaded_bytes", fields.next())?;
    let total = parse_bytes("total_bytes", fields.next())?;
    let estimate = parse_bytes("total_bytes_estimate", fields.next())?;

    match status {
        "downloading" => Ok(FetchStatus::Downloading {
            downloaded: downloaded.unwrap_or(0),
            total: total.or(estimate).filter(|t| *t > 0),
        }),
        "finished" => Ok(FetchStatus::Finished),
        other => Err(ProtocolError::UnknownStatus(other.to_string())),
    }
}

/// Parse a byte count. Absent and `NA` fields are unknown.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_bytes(field: &'static str, raw: Option<&str>) -> Result<Option<u64>, ProtocolError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(Some(n));
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(Some(n.round() as u64)),
        _ => Err(ProtocolError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}
