//! # pngx-upload
//!
//! Batch-upload the fhswf German handwriting dataset into Paperless-NGX.
//!
//! ## Why this crate?
//!
//! Paperless-NGX is a fine corpus host for handwriting-recognition work, but
//! getting a few thousand dataset samples into it by hand is a non-starter.
//! This crate pulls samples straight from the Hugging Face datasets-server,
//! normalises each image to an opaque JPEG, and feeds them to the Paperless
//! upload endpoint one by one — with per-item error isolation, so one broken
//! sample never costs you the run.
//!
//! ## Pipeline Overview
//!
//! ```text
//! dataset hub
//!  │
//!  ├─ 1. Probe      GET {paperless}/api/ — abort early if unreachable
//!  ├─ 2. Fetch      one sample (image + text) per index via /rows
//!  ├─ 3. Normalise  alpha → white composite, JPEG q95, temp dir
//!  ├─ 4. Title      first 10 words, ≤100 chars, synthetic fallback
//!  ├─ 5. Upload     multipart POST with repeated `tags` fields
//!  └─ 6. Tally      successful / failed counts + success rate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pngx_upload::{BatchRunner, HfDatasetSource, PaperlessClient, UploadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder("http://localhost:8000", "api-token")
//!         .max_documents(25)
//!         .build()?;
//!
//!     let source =
//!         HfDatasetSource::connect("fhswf/german_handwriting", "default", "train", 30).await?;
//!     let client = PaperlessClient::new(&config.base_url, &config.token, 30)?;
//!
//!     let mut runner = BatchRunner::new(source, client, config);
//!     let report = runner.run().await?;
//!     println!("{}/{} uploaded ({:.1}%)",
//!         report.successful, report.attempted, report.success_rate());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pngx-upload` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pngx-upload = { version = "0.2", default-features = false }
//! ```
//!
//! ## Delivery semantics
//!
//! Strictly sequential, at-most-once per index: every index in the requested
//! range is attempted exactly once, there are no retries, and
//! `successful + failed` always equals the number of attempted indices. Use
//! `--start` to resume a partial run.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dataset;
pub mod error;
pub mod paperless;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod runner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{UploadConfig, UploadConfigBuilder};
pub use dataset::{HfDatasetSource, Sample, SampleSource};
pub use error::{ItemError, UploadError};
pub use paperless::{DocumentSink, PaperlessClient, TaskStatus, UploadRequest};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use report::{ItemFailure, RunReport};
pub use runner::{BatchRunner, RunState};
