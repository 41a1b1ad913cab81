//! Run outcome types: the tally and per-item failure records.
//!
//! The runner accumulates exactly one piece of state across the run — the
//! success/failure tally — and returns it here together with the failures it
//! recovered from. `successful + failed` always equals `attempted`, for every
//! prefix of the run, which is what makes resuming with `--start` sound.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};

/// One recovered per-sample failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    /// 0-indexed dataset position of the failed sample.
    pub index: usize,
    /// What went wrong.
    pub error: ItemError,
}

/// Final report for a completed run.
///
/// Returned by [`crate::runner::BatchRunner::run`] even when every item
/// failed; only pre-flight and environment errors abort the run entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Number of indices attempted. Equals `successful + failed`.
    pub attempted: usize,
    /// Uploads Paperless accepted.
    pub successful: usize,
    /// Samples that failed anywhere between fetch and upload.
    pub failed: usize,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: u64,
    /// Every recovered failure, in attempt order.
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    /// Percentage of attempted items that succeeded, in `0.0..=100.0`.
    ///
    /// Returns 0.0 when nothing was attempted (the empty-range case must not
    /// divide by zero).
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.successful as f64 / self.attempted as f64 * 100.0
        }
    }

    /// Overall success: at least one document was accepted.
    pub fn is_success(&self) -> bool {
        self.successful > 0
    }
}
