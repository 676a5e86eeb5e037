//! Progress event emitter port.
//!
//! This port abstracts progress event emission, allowing the job runner to
//! publish events without coupling to transport details (broadcast channel,
//! SSE, terminal output).

use crate::events::ProgressEvent;

/// Trait for emitting progress events.
///
/// # Implementations
///
/// - [`crate::ProgressBus`] - broadcast to every attached observer
/// - [`NoopEmitter`] - for tests and contexts without observers
#[cfg_attr(test, mockall::automock)]
pub trait ProgressEmitter: Send + Sync {
    /// Emit a progress event.
    ///
    /// Implementations must not block; with nobody listening the event is
    /// discarded.
    fn emit(&self, event: ProgressEvent);
}

/// A no-op emitter that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl ProgressEmitter for NoopEmitter {
    fn emit(&self, _event: ProgressEvent) {
        // Intentionally do nothing
    }
}
