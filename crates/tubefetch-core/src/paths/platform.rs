//! Platform-specific Downloads directory detection.

use std::env;
use std::path::{Path, PathBuf};

use super::ensure::ensure_download_dir;
use super::error::PathError;

/// Subfolder of the user's Downloads directory that receives media.
pub const DOWNLOAD_SUBFOLDER: &str = "YouTubeDownloads";

/// Environment variable overriding the download directory.
pub const DOWNLOAD_DIR_ENV: &str = "TUBEFETCH_DOWNLOAD_DIR";

/// File name placeholders handed to the fetcher.
pub const OUTPUT_FILENAME_TEMPLATE: &str = "%(title)s.%(ext)s";

const SUPPORTED_OS: &[&str] = &["windows", "macos", "linux"];

fn downloads_dir_for(os: &str, home: Option<PathBuf>) -> Result<PathBuf, PathError> {
    if !SUPPORTED_OS.contains(&os) {
        return Err(PathError::UnsupportedPlatform(os.to_string()));
    }
    let home = home.ok_or(PathError::NoHomeDir)?;
    Ok(home.join("Downloads"))
}

/// The user's Downloads directory (`<home>/Downloads`).
///
/// Fails with [`PathError::UnsupportedPlatform`] outside Windows, macOS and Linux.
pub fn default_downloads_dir() -> Result<PathBuf, PathError> {
    downloads_dir_for(env::consts::OS, dirs::home_dir())
}

/// The app-specific media folder inside Downloads, created if absent.
pub fn media_download_dir() -> Result<PathBuf, PathError> {
    let dir = default_downloads_dir()?.join(DOWNLOAD_SUBFOLDER);
    ensure_download_dir(&dir)?;
    Ok(dir)
}

/// Resolve the directory a job writes into.
///
/// Resolution order:
/// 1. `configured` (from the server configuration)
/// 2. `TUBEFETCH_DOWNLOAD_DIR` environment variable
/// 3. `<home>/Downloads/YouTubeDownloads`
pub fn resolve_download_dir(configured: Option<&Path>) -> Result<PathBuf, PathError> {
    if let Some(dir) = configured {
        ensure_download_dir(dir)?;
        return Ok(dir.to_path_buf());
    }

    if let Ok(raw) = env::var(DOWNLOAD_DIR_ENV) {
        if !raw.trim().is_empty() {
            let dir = PathBuf::from(raw.trim());
            ensure_download_dir(&dir)?;
            return Ok(dir);
        }
    }

    media_download_dir()
}

/// Build the fetcher output template for `dir`.
pub fn output_template(dir: &Path) -> String {
    dir.join(OUTPUT_FILENAME_TEMPLATE)
        .to_string_lossy()
        .into_owned()
}
