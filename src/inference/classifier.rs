//! BirdNET-backed classifier.

use std::path::Path;

use birdnet_onnx::{
    Classifier, ClassifierBuilder, ExecutionProviderInfo, InferenceOptions,
    available_execution_providers, ort_execution_providers::CUDAExecutionProvider,
};
use tracing::{debug, info, warn};

use crate::audio::{normalize, resample, segment_audio};
use crate::config::InferenceDevice;
use crate::constants::capture::SAMPLE_RATE;
use crate::error::{Error, Result};
use crate::inference::{ClassifierHints, RawDetection, SpeciesClassifier};

/// Species classifier wrapping a `BirdNET` ONNX model.
///
/// Constructed once at startup and passed into the sampling loop; the model
/// session is reused for every window. Location/date hints are accepted for
/// interface compatibility but the local model is location-agnostic, so they
/// only annotate the logs.
pub struct BirdClassifier {
    inner: Classifier,
}

impl BirdClassifier {
    /// Load a classifier from model and labels files.
    ///
    /// `min_confidence` is applied inside the model wrapper; predictions
    /// below it never surface as raw detections.
    pub fn new(
        model_path: &Path,
        labels_path: &Path,
        device: InferenceDevice,
        min_confidence: f32,
        top_k: usize,
    ) -> Result<Self> {
        let available = available_execution_providers();
        debug!("available execution providers: {available:?}");

        let builder = ClassifierBuilder::new()
            .model_path(model_path.to_string_lossy().to_string())
            .labels_path(labels_path.to_string_lossy().to_string())
            .top_k(top_k)
            .min_confidence(min_confidence);

        let cuda_available = available.contains(&ExecutionProviderInfo::Cuda);
        let builder = match device {
            InferenceDevice::Cpu => {
                info!("Requested device: CPU");
                builder
            }
            InferenceDevice::Auto => {
                if cuda_available {
                    info!("Auto mode: CUDA available, attempting GPU");
                    builder.execution_provider(CUDAExecutionProvider::default())
                } else {
                    info!("Auto mode: no GPU providers available, using CPU");
                    builder
                }
            }
            InferenceDevice::Gpu => {
                if cuda_available {
                    info!("Requested device: CUDA");
                    builder.execution_provider(CUDAExecutionProvider::default())
                } else {
                    warn!("GPU requested but CUDA is unavailable, using CPU");
                    builder
                }
            }
        };

        let inner = builder.build().map_err(|e| Error::ClassifierBuild {
            reason: e.to_string(),
        })?;

        info!(
            "Loaded model: {:?}, sample_rate: {}, segment_duration: {}s",
            inner.config().model_type,
            inner.config().sample_rate,
            inner.config().segment_duration,
        );

        Ok(Self { inner })
    }

    /// The sample rate the loaded model expects.
    pub fn model_sample_rate(&self) -> u32 {
        self.inner.config().sample_rate
    }
}

impl SpeciesClassifier for BirdClassifier {
    fn analyze(&self, samples: &[i16], hints: &ClassifierHints) -> Result<Vec<RawDetection>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "analyzing {} samples (lat={:?}, lon={:?}, date={:?})",
            samples.len(),
            hints.latitude,
            hints.longitude,
            hints.date,
        );

        let model_rate = self.inner.config().sample_rate;
        let segment_duration = self.inner.config().segment_duration;

        let audio = resample(normalize(samples), SAMPLE_RATE, model_rate)?;
        let segments = segment_audio(&audio, model_rate, segment_duration);

        let options = InferenceOptions::default();
        let mut detections = Vec::new();
        for segment in &segments {
            let result = self
                .inner
                .predict(&segment.samples, &options)
                .map_err(|e| Error::Inference {
                    reason: e.to_string(),
                })?;

            for pred in &result.predictions {
                detections.push(RawDetection::from_label(
                    &pred.species,
                    pred.confidence,
                    segment.start_time,
                    segment.end_time,
                ));
            }
        }

        debug!(
            "classifier produced {} raw detections over {} segments",
            detections.len(),
            segments.len()
        );

        Ok(detections)
    }
}
