//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CLIP_DIR, DEFAULT_DB_FILE, DEFAULT_MIN_CONFIDENCE};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier model files.
    pub model: Option<ModelConfig>,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Classifier model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the labels file.
    pub labels: PathBuf,
}

/// Default pipeline settings, overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Minimum confidence threshold for detections.
    pub min_confidence: f32,

    /// Latitude hint for the classifier.
    pub latitude: Option<f64>,

    /// Longitude hint for the classifier.
    pub longitude: Option<f64>,

    /// Directory for evidence clips; `None` disables clip extraction.
    pub clip_dir: Option<PathBuf>,

    /// SQLite database path.
    pub database: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            latitude: None,
            longitude: None,
            clip_dir: Some(PathBuf::from(DEFAULT_CLIP_DIR)),
            database: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

/// Inference device configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Automatically select (GPU if available, else CPU).
    #[default]
    Auto,
    /// Prefer GPU, fall back to CPU with a warning.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,
}
