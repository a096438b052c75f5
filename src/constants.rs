//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "feathercast";

/// Default minimum confidence threshold for detections.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;

/// Default number of top predictions to return per segment.
pub const DEFAULT_TOP_K: usize = 5;

/// Default SQLite database filename.
pub const DEFAULT_DB_FILE: &str = "detections.db";

/// Default directory for extracted evidence clips.
pub const DEFAULT_CLIP_DIR: &str = "bird_audio_clips";

/// Capture format constants.
///
/// The capture source delivers signed 16-bit mono PCM at 16 kHz regardless
/// of the stream's native format; the byte-count contract for one window is
/// `SAMPLE_RATE * BYTES_PER_SAMPLE * duration`.
pub mod capture {
    use std::time::Duration;

    /// Capture sample rate in Hz.
    pub const SAMPLE_RATE: u32 = 16_000;

    /// Bytes per sample (signed 16-bit PCM).
    pub const BYTES_PER_SAMPLE: usize = 2;

    /// Number of channels (mono).
    pub const CHANNELS: u16 = 1;

    /// Extra time beyond the requested window duration before a capture
    /// read is abandoned. Bounds the read against a stream that stalls
    /// without closing, so one capture never outlives its window by more
    /// than this slack.
    pub const READ_DEADLINE_SLACK: Duration = Duration::from_secs(5);
}

/// Detection grouping constants.
pub mod grouping {
    /// Merge tolerance in seconds. Raw detection ranges for one species
    /// whose gap is at most this long collapse into one merged interval.
    pub const MERGE_TOLERANCE_SECS: f64 = 1.0;
}

/// Sampling loop constants.
pub mod sampling {
    use std::time::Duration;

    /// Fixed pause between loop iterations, bounding iteration rate.
    pub const LOOP_PAUSE: Duration = Duration::from_secs(1);

    /// Back-off after a failed capture before the next attempt.
    pub const CAPTURE_RETRY_PAUSE: Duration = Duration::from_secs(1);
}

/// Recency query defaults.
pub mod query {
    /// Default trailing window for the recency query.
    pub const DEFAULT_WINDOW_SECS: i64 = 24 * 60 * 60;

    /// Default maximum number of rows returned.
    pub const DEFAULT_LIMIT: u32 = 5;
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
}
