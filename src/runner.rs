//! The batch runner: drives fetch → normalise → title → upload over a
//! bounded index range.
//!
//! ## Life of a run
//!
//! ```text
//! NotStarted ──probe ok──▶ ConnectionVerified ──▶ Running ──▶ Completed
//!      │
//!      └──probe failed──▶ Aborted (fatal, nothing uploaded)
//! ```
//!
//! Processing is strictly sequential: one sample at a time, each network
//! call blocking the runner until it finishes or times out. The only state
//! carried across items is the success/failure tally, so there is nothing
//! to lock. Per-item failures are recovered, tallied, and logged; they never
//! abort the run. Normalised JPEGs live in one [`TempDir`] scoped to the
//! run, removed on every exit path including panics.

use crate::config::UploadConfig;
use crate::dataset::SampleSource;
use crate::error::{ItemError, UploadError};
use crate::paperless::{DocumentSink, UploadRequest};
use crate::pipeline::{normalize, title};
use crate::report::{ItemFailure, RunReport};
use chrono::Local;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{info, warn};

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, nothing attempted.
    NotStarted,
    /// Pre-flight probe succeeded.
    ConnectionVerified,
    /// Iterating the index range.
    Running,
    /// Full range attempted; see the [`RunReport`] for the tally.
    Completed,
    /// Pre-flight probe failed; nothing was uploaded.
    Aborted,
}

/// Sequentially uploads a dataset slice into a document sink.
///
/// Generic over [`SampleSource`] and [`DocumentSink`] so the whole control
/// flow is testable with in-memory fakes.
pub struct BatchRunner<S, K> {
    source: S,
    sink: K,
    config: UploadConfig,
    state: RunState,
}

impl<S: SampleSource, K: DocumentSink> BatchRunner<S, K> {
    pub fn new(source: S, sink: K, config: UploadConfig) -> Self {
        Self {
            source,
            sink,
            config,
            state: RunState::NotStarted,
        }
    }

    /// Current state of this runner.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run: probe, then attempt every index in
    /// `[start, min(start+max, len))` exactly once.
    ///
    /// Returns a [`RunReport`] even when every item failed. `Err` is
    /// reserved for fatal conditions: failed connectivity probe or an
    /// unusable temp workspace.
    pub async fn run(&mut self) -> Result<RunReport, UploadError> {
        if !self.sink.check_connection().await {
            self.state = RunState::Aborted;
            return Err(UploadError::ConnectionFailed {
                url: self.config.base_url.clone(),
            });
        }
        self.state = RunState::ConnectionVerified;

        let workspace = TempDir::new().map_err(|e| UploadError::Workspace { source: e })?;

        let start = self.config.start_index;
        let end = (start + self.config.max_documents).min(self.source.len());
        let total = end.saturating_sub(start);
        info!(
            "Uploading {} documents (indices {}..{}) in batches of {}",
            total, start, end, self.config.batch_size
        );

        if let Some(cb) = &self.config.progress_callback {
            cb.on_run_start(total);
        }

        self.state = RunState::Running;
        let run_start = Instant::now();
        let mut report = RunReport::default();

        let mut batch_start = start;
        while batch_start < end {
            let batch_end = (batch_start + self.config.batch_size).min(end);
            let batch_num = (batch_start - start) / self.config.batch_size + 1;
            info!(
                "Batch {}: documents {} to {}",
                batch_num,
                batch_start + 1,
                batch_end
            );

            for index in batch_start..batch_end {
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_item_start(index, total);
                }

                report.attempted += 1;
                match self.process_item(workspace.path(), index).await {
                    Ok((item_title, task_id)) => {
                        report.successful += 1;
                        info!("Uploaded sample {}: '{}' (task {})", index + 1, item_title, task_id);
                        if let Some(cb) = &self.config.progress_callback {
                            cb.on_item_uploaded(index, total, &item_title, &task_id);
                        }
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!("Sample {} failed: {e}", index + 1);
                        if let Some(cb) = &self.config.progress_callback {
                            cb.on_item_error(index, total, &e.to_string());
                        }
                        report.failures.push(ItemFailure { index, error: e });
                    }
                }

                // Fixed pacing, no backoff: a failed item does not slow the
                // next one down.
                if self.config.item_delay_ms > 0 {
                    sleep(Duration::from_millis(self.config.item_delay_ms)).await;
                }
            }

            info!(
                "Batch {} done. Progress: {}/{} (success: {}, failed: {})",
                batch_num, report.attempted, total, report.successful, report.failed
            );
            if let Some(cb) = &self.config.progress_callback {
                cb.on_batch_complete(batch_num, report.attempted, report.successful, report.failed);
            }

            if batch_end < end && self.config.batch_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            batch_start = batch_end;
        }

        report.duration_ms = run_start.elapsed().as_millis() as u64;
        self.state = RunState::Completed;

        info!(
            "Run complete: {}/{} uploaded ({:.1}% success) in {}ms",
            report.successful,
            report.attempted,
            report.success_rate(),
            report.duration_ms
        );
        if let Some(cb) = &self.config.progress_callback {
            cb.on_run_complete(report.successful, report.failed);
        }

        Ok(report)
    }

    /// Fetch, normalise, and submit one sample. Any `Err` is per-item.
    async fn process_item(
        &self,
        workspace: &Path,
        index: usize,
    ) -> Result<(String, String), ItemError> {
        let sample = self.source.fetch(index).await?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let file_path = workspace.join(format!("handwriting_{:05}_{timestamp}.jpg", index + 1));
        normalize::normalize_to_jpeg(&sample.image, &file_path, self.config.jpeg_quality)?;

        let item_title =
            title::derive_title(&self.config.title_prefix, sample.text.as_deref(), index);

        let request = UploadRequest {
            file_path,
            title: item_title.clone(),
            created: Local::now().date_naive(),
            document_type: self.config.document_type,
            correspondent: self.config.correspondent,
            tag_ids: self.config.tag_ids.clone(),
        };

        let task_id = self.sink.submit(&request).await?;
        Ok((item_title, task_id))
    }
}
