//! End-to-end tests for the upload flow, using in-memory fakes for the
//! dataset hub and the Paperless sink.
//!
//! The fakes let these tests verify the full fetch → normalise → title →
//! submit path — including the JPEG actually written to the run's temp
//! directory — without any network access.

use image::{DynamicImage, Rgba, RgbaImage};
use pngx_upload::{
    BatchRunner, DocumentSink, ItemError, RunState, Sample, SampleSource, UploadConfig,
    UploadProgressCallback, UploadRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Serves transparent-red RGBA samples; index 2 carries no text.
struct TransparentSource {
    len: usize,
}

impl SampleSource for TransparentSource {
    fn len(&self) -> usize {
        self.len
    }

    async fn fetch(&self, index: usize) -> Result<Sample, ItemError> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            16,
            16,
            Rgba([255, 0, 0, 0]), // fully transparent red
        ));
        let text = if index == 2 {
            None
        } else {
            Some(format!("Probe {} der Handschrift", index))
        };
        Ok(Sample { index, image, text })
    }
}

/// Decodes every submitted file and records what it saw.
#[derive(Clone)]
struct InspectingSink {
    titles: Arc<Mutex<Vec<String>>>,
    all_opaque_white: Arc<Mutex<bool>>,
}

impl InspectingSink {
    fn new() -> Self {
        Self {
            titles: Arc::new(Mutex::new(Vec::new())),
            all_opaque_white: Arc::new(Mutex::new(true)),
        }
    }
}

impl DocumentSink for InspectingSink {
    async fn check_connection(&self) -> bool {
        true
    }

    async fn submit(&self, request: &UploadRequest) -> Result<String, ItemError> {
        // The temp file must exist and decode at submission time.
        let decoded = image::open(&request.file_path).map_err(|e| ItemError::Rejected {
            status: 400,
            body: e.to_string(),
        })?;

        let mut ok = self.all_opaque_white.lock().unwrap();
        if decoded.color().has_alpha() {
            *ok = false;
        }
        // The transparent source pixel must have been composited onto white.
        let px = decoded.to_rgb8().get_pixel(8, 8).0;
        if px.iter().any(|&c| c < 245) {
            *ok = false;
        }
        drop(ok);

        self.titles.lock().unwrap().push(request.title.clone());
        Ok(format!("task-{}", request.title.len()))
    }
}

fn config() -> UploadConfig {
    UploadConfig::builder("http://localhost:8000", "tok")
        .max_documents(4)
        .batch_size(2)
        .item_delay_ms(0)
        .batch_delay_ms(0)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn transparent_samples_arrive_as_opaque_white_jpegs() {
    let sink = InspectingSink::new();
    let mut runner = BatchRunner::new(TransparentSource { len: 10 }, sink.clone(), config());

    let report = runner.run().await.unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.successful, 4);
    assert!(*sink.all_opaque_white.lock().unwrap(), "found non-white or alpha pixels");
}

#[tokio::test]
async fn titles_follow_text_and_fallback_rules() {
    let sink = InspectingSink::new();
    let mut runner = BatchRunner::new(TransparentSource { len: 10 }, sink.clone(), config());

    runner.run().await.unwrap();
    let titles = sink.titles.lock().unwrap();
    assert_eq!(titles.len(), 4);
    assert_eq!(titles[0], "German Handwriting: Probe 0 der Handschrift");
    // Index 2 has no text → synthetic 1-based, 5-digit title.
    assert_eq!(titles[2], "German Handwriting Sample 00003");
    assert!(titles.iter().all(|t| t.chars().count() <= 100));
}

/// `successful + failed == attempted` must hold at every batch boundary,
/// not just at the end.
#[tokio::test]
async fn tally_invariant_holds_for_every_prefix() {
    struct PrefixChecker {
        violations: AtomicUsize,
        batches_seen: AtomicUsize,
    }

    impl UploadProgressCallback for PrefixChecker {
        fn on_batch_complete(&self, _b: usize, attempted: usize, successful: usize, failed: usize) {
            self.batches_seen.fetch_add(1, Ordering::SeqCst);
            if successful + failed != attempted {
                self.violations.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Rejects every other submission.
    #[derive(Clone)]
    struct FlakySink {
        calls: Arc<AtomicUsize>,
    }

    impl DocumentSink for FlakySink {
        async fn check_connection(&self) -> bool {
            true
        }
        async fn submit(&self, _request: &UploadRequest) -> Result<String, ItemError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Ok(format!("task-{n}"))
            } else {
                Err(ItemError::Rejected {
                    status: 500,
                    body: "flaky".into(),
                })
            }
        }
    }

    let checker = Arc::new(PrefixChecker {
        violations: AtomicUsize::new(0),
        batches_seen: AtomicUsize::new(0),
    });
    let config = UploadConfig::builder("http://localhost:8000", "tok")
        .max_documents(7)
        .batch_size(3)
        .item_delay_ms(0)
        .batch_delay_ms(0)
        .progress_callback(checker.clone())
        .build()
        .unwrap();

    let sink = FlakySink {
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let mut runner = BatchRunner::new(TransparentSource { len: 100 }, sink, config);

    let report = runner.run().await.unwrap();
    assert_eq!(checker.batches_seen.load(Ordering::SeqCst), 3); // 3+3+1
    assert_eq!(checker.violations.load(Ordering::SeqCst), 0);
    assert_eq!(report.attempted, 7);
    assert_eq!(report.successful, 4);
    assert_eq!(report.failed, 3);
    assert_eq!(runner.state(), RunState::Completed);
}

/// Paperless returning 500 for every call: the run still completes, with a
/// zero-success report the CLI maps to exit code 1.
#[tokio::test]
async fn all_rejections_yield_zero_success_report() {
    #[derive(Clone)]
    struct AlwaysReject;

    impl DocumentSink for AlwaysReject {
        async fn check_connection(&self) -> bool {
            true
        }
        async fn submit(&self, _request: &UploadRequest) -> Result<String, ItemError> {
            Err(ItemError::Rejected {
                status: 500,
                body: "internal server error".into(),
            })
        }
    }

    let mut runner = BatchRunner::new(TransparentSource { len: 10 }, AlwaysReject, config());
    let report = runner.run().await.unwrap();

    assert_eq!(report.successful, 0);
    assert_eq!(report.failed, 4);
    assert!(!report.is_success());
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f.error, ItemError::Rejected { status: 500, .. })));
}
