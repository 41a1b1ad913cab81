//! Configuration types for a batch-upload run.
//!
//! All run behaviour is controlled through [`UploadConfig`], built via its
//! [`UploadConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to pass the whole run description around by reference and to diff two runs
//! to understand why their outcomes differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::UploadError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for one upload run.
///
/// Built via [`UploadConfig::builder()`].
///
/// # Example
/// ```rust
/// use pngx_upload::UploadConfig;
///
/// let config = UploadConfig::builder("http://localhost:8000", "s3cret-token")
///     .max_documents(25)
///     .start_index(100)
///     .batch_size(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct UploadConfig {
    /// Base URL of the Paperless-NGX instance. Trailing slashes are trimmed.
    pub base_url: String,

    /// Paperless-NGX API token, sent as `Authorization: Token <token>`.
    pub token: String,

    /// Maximum number of documents to upload. Default: 50.
    pub max_documents: usize,

    /// Starting index in the dataset (0-indexed). Default: 0.
    pub start_index: usize,

    /// Optional Paperless document-type id assigned to every upload.
    pub document_type: Option<u32>,

    /// Optional Paperless correspondent id assigned to every upload.
    pub correspondent: Option<u32>,

    /// Paperless tag ids assigned to every upload.
    ///
    /// Each id becomes its own repeated `tags` form field; Paperless does
    /// not accept a comma-joined value.
    pub tag_ids: Vec<u32>,

    /// Number of samples per progress batch. Default: 10.
    ///
    /// Batching is purely for progress reporting and pacing; it carries no
    /// transactional meaning.
    pub batch_size: usize,

    /// Title prefix for derived and synthetic titles. Default: "German Handwriting".
    pub title_prefix: String,

    /// JPEG quality for normalised images. Range: 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Per-request HTTP timeout in seconds. Default: 30.
    ///
    /// This bounds each individual network call; there is no timeout on the
    /// overall run.
    pub request_timeout_secs: u64,

    /// Pause after each item in milliseconds. Default: 100.
    ///
    /// A fixed delay keeps the upload rate polite toward the Paperless
    /// consumer queue. There is deliberately no backoff on failure; a failed
    /// item is tallied and the next one proceeds at the same pace.
    pub item_delay_ms: u64,

    /// Pause after each completed batch (except the last) in milliseconds.
    /// Default: 1000.
    pub batch_delay_ms: u64,

    /// Progress callback. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("max_documents", &self.max_documents)
            .field("start_index", &self.start_index)
            .field("document_type", &self.document_type)
            .field("correspondent", &self.correspondent)
            .field("tag_ids", &self.tag_ids)
            .field("batch_size", &self.batch_size)
            .field("title_prefix", &self.title_prefix)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("item_delay_ms", &self.item_delay_ms)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl UploadConfig {
    /// Create a new builder with the two required fields.
    pub fn builder(base_url: impl Into<String>, token: impl Into<String>) -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: UploadConfig {
                base_url: base_url.into(),
                token: token.into(),
                max_documents: 50,
                start_index: 0,
                document_type: None,
                correspondent: None,
                tag_ids: Vec::new(),
                batch_size: 10,
                title_prefix: "German Handwriting".to_string(),
                jpeg_quality: 95,
                request_timeout_secs: 30,
                item_delay_ms: 100,
                batch_delay_ms: 1000,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`UploadConfig`].
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn max_documents(mut self, n: usize) -> Self {
        self.config.max_documents = n;
        self
    }

    pub fn start_index(mut self, n: usize) -> Self {
        self.config.start_index = n;
        self
    }

    pub fn document_type(mut self, id: u32) -> Self {
        self.config.document_type = Some(id);
        self
    }

    pub fn correspondent(mut self, id: u32) -> Self {
        self.config.correspondent = Some(id);
        self
    }

    pub fn tag_ids(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.config.tag_ids = ids.into_iter().collect();
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.max(1);
        self
    }

    pub fn title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.title_prefix = prefix.into();
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn item_delay_ms(mut self, ms: u64) -> Self {
        self.config.item_delay_ms = ms;
        self
    }

    pub fn batch_delay_ms(mut self, ms: u64) -> Self {
        self.config.batch_delay_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<UploadConfig, UploadError> {
        let c = &mut self.config;

        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(UploadError::InvalidConfig(format!(
                "URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        while c.base_url.ends_with('/') {
            c.base_url.pop();
        }
        if c.token.is_empty() {
            return Err(UploadError::InvalidConfig("API token must not be empty".into()));
        }
        if c.max_documents == 0 {
            return Err(UploadError::InvalidConfig(
                "max_documents must be ≥ 1".into(),
            ));
        }
        if c.batch_size == 0 {
            return Err(UploadError::InvalidConfig("batch_size must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
