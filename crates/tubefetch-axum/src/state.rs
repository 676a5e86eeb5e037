//! Shared application state type.

use crate::bootstrap::AppContext;
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// This is an Arc-wrapped `AppContext` holding the job runner, the progress
/// bus and the asset directories.
pub type AppState = Arc<AppContext>;
