//! The sampling loop driving capture, classification, and persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::CaptureSource;
use crate::clipper::DetectionGrouper;
use crate::constants::query::{DEFAULT_LIMIT, DEFAULT_WINDOW_SECS};
use crate::constants::sampling::{CAPTURE_RETRY_PAUSE, LOOP_PAUSE};
use crate::error::Result;
use crate::inference::{ClassifierHints, RawDetection, SpeciesClassifier};
use crate::store::DetectionStore;

/// Settings for one sampling loop instance.
#[derive(Debug, Clone, Copy)]
pub struct SamplingOptions {
    /// Duration of each capture window in seconds.
    pub sample_duration: u32,
    /// Location/date hints forwarded to the classifier.
    pub hints: ClassifierHints,
    /// Confidence floor used when logging the recent-detections snapshot.
    pub min_confidence: f32,
}

/// Drives the pipeline: capture, classify, consolidate, persist, repeat.
///
/// Capture of window N+1 overlaps classification of window N through a
/// capacity-1 channel; a slow consumer delays the next capture start rather
/// than dropping a completed window, and at most one classification runs at
/// a time. Cancellation is observed at iteration boundaries, so shutdown
/// latency is bounded by one sample duration.
pub struct SamplingLoop {
    capture: Arc<dyn CaptureSource>,
    classifier: Arc<dyn SpeciesClassifier>,
    grouper: DetectionGrouper,
    store: DetectionStore,
    options: SamplingOptions,
    cancel: Arc<AtomicBool>,
}

impl SamplingLoop {
    /// Assemble a sampling loop from its collaborators.
    #[must_use]
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        classifier: Arc<dyn SpeciesClassifier>,
        grouper: DetectionGrouper,
        store: DetectionStore,
        options: SamplingOptions,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            capture,
            classifier,
            grouper,
            store,
            options,
            cancel,
        }
    }

    /// Run until the cancellation flag is set.
    ///
    /// Capture and classifier failures are confined to their window: logged,
    /// the window's detections lost, the loop continues. Store failures
    /// propagate — silently dropping the durable record is not acceptable.
    pub async fn run(self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Vec<i16>>(1);
        let producer = spawn_capture_task(
            Arc::clone(&self.capture),
            self.options.sample_duration,
            Arc::clone(&self.cancel),
            tx,
        );

        while let Some(window) = rx.recv().await {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }

            if window.is_empty() {
                debug!("empty capture window, skipping classification");
            } else if let Some(raw) = self.classify(window.clone()).await {
                let detections = self.grouper.group_window(raw, &window);
                for detection in &detections {
                    self.store.insert(detection).await?;
                }
            }

            // The snapshot goes out every iteration, quiet windows included.
            self.log_recent().await;
        }

        drop(rx);
        if let Err(e) = producer.await {
            warn!("capture task did not shut down cleanly: {e}");
        }

        info!("sampling loop stopped");
        Ok(())
    }

    /// Classify one window on a blocking task.
    ///
    /// Returns `None` on failure: the audio window is transient, so there is
    /// nothing to retry.
    async fn classify(&self, samples: Vec<i16>) -> Option<Vec<RawDetection>> {
        let classifier = Arc::clone(&self.classifier);
        let hints = self.options.hints;
        match tokio::task::spawn_blocking(move || classifier.analyze(&samples, &hints)).await {
            Ok(Ok(raw)) => Some(raw),
            Ok(Err(e)) => {
                warn!("classifier failed, dropping window: {e}");
                None
            }
            Err(e) => {
                warn!("classifier task failed, dropping window: {e}");
                None
            }
        }
    }

    /// Log each species' most recent sighting within the default window.
    async fn log_recent(&self) {
        match self
            .store
            .query_recent(
                DEFAULT_LIMIT,
                self.options.min_confidence,
                Duration::seconds(DEFAULT_WINDOW_SECS),
            )
            .await
        {
            Ok(records) => {
                for record in records {
                    info!(
                        "{} ({}) - confidence: {:.2} | clip: {} | time: {:.1}-{:.1} ({})",
                        record.common_name,
                        record.scientific_name,
                        record.confidence,
                        record.file_path.as_deref().unwrap_or("-"),
                        record.start_time,
                        record.end_time,
                        record.timestamp,
                    );
                }
            }
            Err(e) => warn!("recent-detections query failed: {e}"),
        }
    }
}

/// Capture windows on a blocking task and hand them to the consumer.
///
/// The channel's capacity of one is the whole backpressure story: `send`
/// waits while the previous window is still being processed, so a completed
/// window is never dropped and captures cannot pile up.
fn spawn_capture_task(
    capture: Arc<dyn CaptureSource>,
    duration_secs: u32,
    cancel: Arc<AtomicBool>,
    tx: mpsc::Sender<Vec<i16>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !cancel.load(Ordering::Relaxed) {
            let source = Arc::clone(&capture);
            let result =
                tokio::task::spawn_blocking(move || source.capture_window(duration_secs)).await;

            match result {
                Ok(Ok(window)) => {
                    if tx.send(window).await.is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    warn!("capture failed: {e}");
                    tokio::time::sleep(CAPTURE_RETRY_PAUSE).await;
                }
                Err(e) => {
                    warn!("capture task failed: {e}");
                    break;
                }
            }

            tokio::time::sleep(LOOP_PAUSE).await;
        }
    })
}
