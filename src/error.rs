//! Error types for feathercast.

/// Result type alias for feathercast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for feathercast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to initialize ONNX runtime.
    #[error("failed to initialize ONNX runtime: {reason}")]
    RuntimeInitialization {
        /// Description of the initialization failure.
        reason: String,
    },

    /// Failed to build classifier.
    #[error("failed to build classifier: {reason}")]
    ClassifierBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Failed to spawn the capture subprocess.
    #[error("failed to spawn capture process '{command}'")]
    CaptureSpawn {
        /// Command that failed to spawn.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read from the capture subprocess.
    #[error("failed to read from capture process")]
    CaptureRead {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Clip interval maps outside the source window.
    ///
    /// Offsets are derived from the same window the classifier saw, so this
    /// signals a logic error upstream rather than bad input.
    #[error(
        "clip interval [{start_frame}, {end_frame}) exceeds source length of {source_frames} frames"
    )]
    ClipOutOfRange {
        /// First frame of the requested interval.
        start_frame: usize,
        /// One past the last frame of the requested interval.
        end_frame: usize,
        /// Total frames available in the source window.
        source_frames: usize,
    },

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWriteFailed {
        /// Path to the WAV file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open the detection database.
    #[error("failed to open detection database '{path}'")]
    StoreOpen {
        /// Path to the database file.
        path: std::path::PathBuf,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// Database operation failed.
    #[error("database operation failed")]
    Store {
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::Store { source }
    }
}
