//! Download directory resolution.
//!
//! Downloads land in `<home>/Downloads/YouTubeDownloads` unless an explicit
//! directory is configured.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - Resolution runs per job, so a failure fails that job only
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod platform;

// Error type
pub use error::PathError;

// Platform detection and roots
pub use platform::{
    DOWNLOAD_DIR_ENV, DOWNLOAD_SUBFOLDER, OUTPUT_FILENAME_TEMPLATE, default_downloads_dir,
    media_download_dir, output_template, resolve_download_dir,
};

// Directory operations
pub use ensure::ensure_download_dir;
