//! Error types for the pngx-upload library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`UploadError`] — **Fatal**: the run cannot proceed at all (bad
//!   configuration, unreachable Paperless instance, dataset hub down).
//!   Returned as `Err(UploadError)` from [`crate::runner::BatchRunner::run`].
//!
//! * [`ItemError`] — **Non-fatal**: a single sample failed (fetch glitch,
//!   JPEG encode failure, rejected upload) but every other sample is fine.
//!   Stored inside [`crate::report::ItemFailure`] so callers can inspect
//!   partial success rather than losing the whole run to one bad sample.
//!
//! The separation lets callers decide their own tolerance: a run with some
//! failed items still completes and reports a tally; only pre-flight and
//! environment problems abort it.

use thiserror::Error;

/// All fatal errors returned by the pngx-upload library.
///
/// Per-sample failures use [`ItemError`] and are stored in
/// [`crate::report::RunReport::failures`] rather than propagated here.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pre-flight connectivity probe failed; nothing was uploaded.
    #[error("Cannot reach Paperless-NGX at '{url}'\nCheck the URL and API token, then try --dry-run.")]
    ConnectionFailed { url: String },

    /// The dataset hub could not report the dataset, so there is no index
    /// range to iterate.
    #[error("Dataset '{dataset}' is unavailable: {reason}")]
    DatasetUnavailable { dataset: String, reason: String },

    /// Could not create the run-scoped temporary workspace.
    #[error("Failed to create temporary workspace: {source}")]
    Workspace {
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A non-fatal error for a single sample.
///
/// Stored in [`crate::report::ItemFailure`] when a sample fails. The run
/// continues; the sample is counted as failed.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// The dataset hub could not produce the sample.
    #[error("sample fetch failed: {detail}")]
    FetchFailed { detail: String },

    /// The sample's image bytes could not be decoded.
    #[error("image decode failed: {detail}")]
    DecodeFailed { detail: String },

    /// The sample's image could not be written as JPEG.
    #[error("JPEG encode failed: {detail}")]
    EncodeFailed { detail: String },

    /// The normalised temp file could not be read back for upload.
    #[error("file read failed: {detail}")]
    FileRead { detail: String },

    /// Paperless answered the upload with a non-success status.
    #[error("upload rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The upload request never produced a response (timeout, DNS, TLS).
    #[error("upload request failed: {detail}")]
    RequestFailed { detail: String },
}
