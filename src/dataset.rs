//! Dataset access: samples from the Hugging Face datasets-server API.
//!
//! ## Why the datasets-server and not parquet downloads?
//!
//! The hub's datasets-server exposes every public dataset as paged JSON rows
//! (`GET /rows?dataset=…&offset=…&length=…`) with images served as plain
//! HTTPS assets. For a sequential uploader that touches a bounded index range
//! this is exactly the right granularity: one small JSON request plus one
//! image download per sample, no local dataset cache, no parquet machinery.
//!
//! The runner only sees the [`SampleSource`] trait, so tests substitute an
//! in-memory source and never touch the network.

use crate::error::{ItemError, UploadError};
use image::DynamicImage;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// One dataset record: an image plus its optional transcription.
///
/// Sourced read-only; lives for one batch iteration.
pub struct Sample {
    /// 0-indexed position in the dataset split.
    pub index: usize,
    /// Decoded image, whatever colour mode the hub serves.
    pub image: DynamicImage,
    /// Transcribed text, if the record carries any.
    pub text: Option<String>,
}

/// A finite, indexable sequence of samples.
///
/// The batch runner drives this; implementations are passive. The concrete
/// hub-backed implementation is [`HfDatasetSource`].
#[allow(async_fn_in_trait)]
pub trait SampleSource {
    /// Total number of samples in the split.
    fn len(&self) -> usize;

    /// True when the split has no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the sample at `index`. A failure here is per-item: the caller
    /// tallies it and moves on.
    async fn fetch(&self, index: usize) -> Result<Sample, ItemError>;
}

const DATASETS_SERVER: &str = "https://datasets-server.huggingface.co";

// ── Wire types for the /rows endpoint ────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<RowEntry>,
    #[serde(default)]
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: RowFields,
}

#[derive(Debug, Deserialize)]
struct RowFields {
    image: ImageRef,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    src: String,
}

/// Hugging Face datasets-server backed [`SampleSource`].
///
/// Connecting queries the split length up front so the runner can clamp its
/// index range before any upload happens.
pub struct HfDatasetSource {
    http: reqwest::Client,
    endpoint: String,
    dataset: String,
    config: String,
    split: String,
    total_rows: usize,
}

impl HfDatasetSource {
    /// Connect to the datasets-server and look up the split length.
    ///
    /// # Errors
    /// [`UploadError::DatasetUnavailable`] when the hub is unreachable or the
    /// dataset/config/split triple does not exist.
    pub async fn connect(
        dataset: &str,
        config: &str,
        split: &str,
        timeout_secs: u64,
    ) -> Result<Self, UploadError> {
        Self::connect_to(DATASETS_SERVER, dataset, config, split, timeout_secs).await
    }

    /// Like [`connect`](Self::connect) but against a caller-supplied endpoint.
    pub async fn connect_to(
        endpoint: &str,
        dataset: &str,
        config: &str,
        split: &str,
        timeout_secs: u64,
    ) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| UploadError::HttpClient(e.to_string()))?;

        let mut source = Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
            config: config.to_string(),
            split: split.to_string(),
            total_rows: 0,
        };

        // One minimal page tells us the split length.
        let first = source
            .rows_page(0, 1)
            .await
            .map_err(|e| UploadError::DatasetUnavailable {
                dataset: dataset.to_string(),
                reason: e.to_string(),
            })?;
        source.total_rows = first.num_rows_total;
        info!(
            "Dataset '{}' split '{}' has {} rows",
            dataset, split, source.total_rows
        );

        Ok(source)
    }

    async fn rows_page(&self, offset: usize, length: usize) -> Result<RowsResponse, ItemError> {
        let url = format!(
            "{}/rows?dataset={}&config={}&split={}&offset={}&length={}",
            self.endpoint, self.dataset, self.config, self.split, offset, length
        );
        debug!("Fetching rows: {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ItemError::FetchFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::FetchFailed {
                detail: format!("HTTP {status} from datasets-server"),
            });
        }

        response
            .json::<RowsResponse>()
            .await
            .map_err(|e| ItemError::FetchFailed {
                detail: format!("malformed rows response: {e}"),
            })
    }

    async fn download_image(&self, src: &str) -> Result<DynamicImage, ItemError> {
        let response = self
            .http
            .get(src)
            .send()
            .await
            .map_err(|e| ItemError::FetchFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::FetchFailed {
                detail: format!("HTTP {status} fetching image asset"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ItemError::FetchFailed {
            detail: e.to_string(),
        })?;

        image::load_from_memory(&bytes).map_err(|e| ItemError::DecodeFailed {
            detail: e.to_string(),
        })
    }
}

impl SampleSource for HfDatasetSource {
    fn len(&self) -> usize {
        self.total_rows
    }

    async fn fetch(&self, index: usize) -> Result<Sample, ItemError> {
        let page = self.rows_page(index, 1).await?;
        let entry = page
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| ItemError::FetchFailed {
                detail: format!("datasets-server returned no row at offset {index}"),
            })?;

        let image = self.download_image(&entry.row.image.src).await?;
        let text = entry
            .row
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Sample { index, image, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_response_parses_hub_shape() {
        let json = r#"{
            "features": [{"feature_idx": 0, "name": "image", "type": {"_type": "Image"}}],
            "rows": [
                {"row_idx": 3,
                 "row": {"image": {"src": "https://example.org/a.jpg", "height": 64, "width": 256},
                         "text": "ein Beispielsatz"},
                 "truncated_cells": []}
            ],
            "num_rows_total": 5000,
            "num_rows_per_page": 100,
            "partial": false
        }"#;
        let parsed: RowsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.num_rows_total, 5000);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].row.image.src, "https://example.org/a.jpg");
        assert_eq!(parsed.rows[0].row.text.as_deref(), Some("ein Beispielsatz"));
    }

    #[test]
    fn rows_response_tolerates_missing_text() {
        let json = r#"{
            "rows": [{"row_idx": 0, "row": {"image": {"src": "https://example.org/b.png"}}}],
            "num_rows_total": 1
        }"#;
        let parsed: RowsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.rows[0].row.text.is_none());
    }
}
