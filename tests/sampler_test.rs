//! Tests for the sampling loop, using fake capture and classifier stages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use chrono::Duration;
use feathercast::capture::CaptureSource;
use feathercast::clipper::DetectionGrouper;
use feathercast::error::{Error, Result};
use feathercast::inference::{ClassifierHints, RawDetection, SpeciesClassifier};
use feathercast::pipeline::{SamplingLoop, SamplingOptions};
use feathercast::store::DetectionStore;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 16_000;

/// Returns a fixed window per call; sets the cancel flag once `windows`
/// captures have been handed out.
struct FakeCapture {
    window: Vec<i16>,
    windows: usize,
    calls: AtomicUsize,
    cancel: Arc<AtomicBool>,
}

impl CaptureSource for FakeCapture {
    fn capture_window(&self, _duration_secs: u32) -> Result<Vec<i16>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call > self.windows {
            self.cancel.store(true, Ordering::Relaxed);
        }
        Ok(self.window.clone())
    }
}

struct FakeClassifier {
    calls: AtomicUsize,
    // Calls (1-based) that fail instead of detecting.
    fail_on: Vec<usize>,
}

impl FakeClassifier {
    fn new(fail_on: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl SpeciesClassifier for FakeClassifier {
    fn analyze(&self, _samples: &[i16], _hints: &ClassifierHints) -> Result<Vec<RawDetection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(Error::Inference {
                reason: "synthetic failure".to_string(),
            });
        }
        Ok(vec![RawDetection::from_label(
            "Passer domesticus_House Sparrow",
            0.9,
            0.0,
            3.0,
        )])
    }
}

async fn open_store(dir: &TempDir) -> DetectionStore {
    let store = DetectionStore::open(&dir.path().join("detections.db"))
        .await
        .expect("Failed to open store");
    store.init().await.expect("Failed to init schema");
    store
}

async fn count_rows(dir: &TempDir) -> usize {
    open_store(dir)
        .await
        .query_recent(100, 0.0, Duration::hours(24))
        .await
        .expect("query failed")
        .len()
}

fn options() -> SamplingOptions {
    SamplingOptions {
        sample_duration: 1,
        hints: ClassifierHints::default(),
        min_confidence: 0.25,
    }
}

async fn run_loop(
    capture: Arc<dyn CaptureSource>,
    classifier: Arc<dyn SpeciesClassifier>,
    store: DetectionStore,
    cancel: Arc<AtomicBool>,
) {
    let grouper = DetectionGrouper::new(1.0, SAMPLE_RATE, None);
    let sampling = SamplingLoop::new(capture, classifier, grouper, store, options(), cancel);

    tokio::time::timeout(StdDuration::from_secs(30), sampling.run())
        .await
        .expect("sampling loop did not stop")
        .expect("sampling loop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_loop_persists_detections_and_stops_on_cancel() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cancel = Arc::new(AtomicBool::new(false));

    let capture = Arc::new(FakeCapture {
        window: vec![1i16; SAMPLE_RATE as usize],
        windows: 2,
        calls: AtomicUsize::new(0),
        cancel: Arc::clone(&cancel),
    });
    let classifier = Arc::new(FakeClassifier::new(Vec::new()));

    let store = open_store(&dir).await;
    run_loop(capture, classifier, store, cancel).await;

    // Two windows classified before cancellation; the recency query
    // collapses them to the species' latest row.
    let store = open_store(&dir).await;
    let records = store
        .query_recent(100, 0.0, Duration::hours(24))
        .await
        .expect("query failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].common_name, "House Sparrow");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_classifier_failure_drops_window_only() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cancel = Arc::new(AtomicBool::new(false));

    let capture = Arc::new(FakeCapture {
        window: vec![1i16; SAMPLE_RATE as usize],
        windows: 2,
        calls: AtomicUsize::new(0),
        cancel: Arc::clone(&cancel),
    });
    // First window fails to classify; the loop continues to the second.
    let classifier = Arc::new(FakeClassifier::new(vec![1]));

    let store = open_store(&dir).await;
    run_loop(capture, classifier, store, cancel).await;

    assert_eq!(count_rows(&dir).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_windows_skip_classification() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cancel = Arc::new(AtomicBool::new(false));

    let capture = Arc::new(FakeCapture {
        window: Vec::new(),
        windows: 2,
        calls: AtomicUsize::new(0),
        cancel: Arc::clone(&cancel),
    });
    let classifier = Arc::new(FakeClassifier::new(Vec::new()));
    let classifier_probe = Arc::clone(&classifier);

    let store = open_store(&dir).await;
    run_loop(capture, classifier, store, cancel).await;

    assert_eq!(classifier_probe.calls.load(Ordering::SeqCst), 0);
    assert_eq!(count_rows(&dir).await, 0);
}
