//! Species classification over captured audio windows.
//!
//! The classifier is an external collaborator to the consolidation pipeline:
//! it takes one window of PCM plus location/date hints and returns raw
//! per-call hits. The [`SpeciesClassifier`] trait is the seam; the shipped
//! implementation wraps a BirdNET ONNX model.

mod classifier;

pub use classifier::BirdClassifier;

use chrono::NaiveDate;

use crate::error::Result;

/// One classifier hit within a sampling window.
///
/// Ephemeral: produced here, consumed by the grouper, never persisted as-is.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Species common name.
    pub common_name: String,
    /// Species scientific name.
    pub scientific_name: String,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Classifier-internal label tag (raw `Scientific_Common` string).
    pub label: String,
    /// Start offset in seconds, relative to the window start.
    pub start: f64,
    /// End offset in seconds, at or after `start`.
    pub end: f64,
}

impl RawDetection {
    /// Build a detection from a species label in `BirdNET` format.
    ///
    /// `BirdNET` labels are formatted as `ScientificName_CommonName`; labels
    /// without an underscore use the whole string for both names.
    pub fn from_label(label: &str, confidence: f32, start: f64, end: f64) -> Self {
        let (scientific_name, common_name) = label.find('_').map_or_else(
            || (label.to_string(), label.to_string()),
            |idx| (label[..idx].to_string(), label[idx + 1..].to_string()),
        );

        Self {
            common_name,
            scientific_name,
            confidence,
            label: label.to_string(),
            start,
            end,
        }
    }
}

/// Location and date hints passed along with each window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierHints {
    /// Recording latitude.
    pub latitude: Option<f64>,
    /// Recording longitude.
    pub longitude: Option<f64>,
    /// Recording date.
    pub date: Option<NaiveDate>,
}

/// A species classifier for fixed-duration audio windows.
///
/// Input is signed 16-bit mono PCM at the capture rate. Implementations
/// apply their own confidence floor; callers treat sub-threshold filtering
/// as already done.
pub trait SpeciesClassifier: Send + Sync {
    /// Analyze one window of audio and return raw detections.
    fn analyze(&self, samples: &[i16], hints: &ClassifierHints) -> Result<Vec<RawDetection>>;
}
