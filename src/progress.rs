//! Progress-callback trait for per-item upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::UploadConfigBuilder::progress_callback`] to receive
//! real-time events as the runner works through the index range.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log file, or a database record
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so callers may share one
//! implementation between the runner and other tasks.

use std::sync::Arc;

/// Called by the batch runner as it processes each sample.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The runner is strictly sequential, so events for a
/// given run always arrive in order and from a single task.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once after the connectivity probe succeeds, before any item
    /// is fetched.
    ///
    /// * `total` — number of samples that will be attempted
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a sample is fetched from the dataset hub.
    ///
    /// * `index` — 0-indexed dataset position
    fn on_item_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a sample was accepted by Paperless.
    ///
    /// * `task_id` — the consumption-task identifier Paperless returned
    fn on_item_uploaded(&self, index: usize, total: usize, title: &str, task_id: &str) {
        let _ = (index, total, title, task_id);
    }

    /// Called when a sample failed (fetch, encode, or upload).
    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called after each batch, with the running tally.
    ///
    /// * `batch` — 1-indexed batch number
    fn on_batch_complete(&self, batch: usize, attempted: usize, successful: usize, failed: usize) {
        let _ = (batch, attempted, successful, failed);
    }

    /// Called once after the full range has been attempted.
    fn on_run_complete(&self, successful: usize, failed: usize) {
        let _ = (successful, failed);
    }
}

/// A no-op implementation for callers that want an explicit callback value
/// without doing anything with the events.
///
/// The runner itself needs no placeholder: an unconfigured
/// [`crate::config::UploadConfig::progress_callback`] is simply `None`.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::UploadConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;
