//! Progress reporting for page collection and crawl fan-out.
//!
//! Collectors and the crawl driver report through [`ProgressCallback`]
//! without knowing how (or whether) progress is rendered. The terminal
//! implementation lives in `filmgraph_cli_utils`.

use std::sync::Arc;

/// Receives progress updates from a long-running operation.
///
/// Must be `Send + Sync` so one reporter can be shared by every crawl
/// worker.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total units of work, once known.
    fn set_total(&self, total: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the operation complete.
    fn finish(&self, msg: String);
}

/// Reporter that discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
