//! Evidence clip extraction.

use crate::clipper::MergedInterval;
use crate::error::{Error, Result};

/// Extracts concatenated audio for a species' merged intervals.
///
/// The output holds exactly the frames inside the intervals, appended in
/// interval order; gaps between non-adjacent intervals are not included, so
/// the clip duration equals the sum of the interval durations.
pub struct ClipExtractor {
    sample_rate: u32,
}

impl ClipExtractor {
    /// Create an extractor for sources at the given sample rate.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Extract frames `[round(start * rate), round(end * rate))` per interval
    /// from the source window and concatenate them in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClipOutOfRange`] when an interval maps past the end
    /// of the source. Offsets are derived from the same window the classifier
    /// saw, so this indicates an upstream logic error and is never silently
    /// truncated.
    pub fn extract(&self, source: &[i16], intervals: &[MergedInterval]) -> Result<Vec<i16>> {
        let mut clip = Vec::new();

        for interval in intervals {
            let start_frame = self.frame_offset(interval.start);
            let end_frame = self.frame_offset(interval.end);

            if end_frame > source.len() || start_frame > end_frame {
                return Err(Error::ClipOutOfRange {
                    start_frame,
                    end_frame,
                    source_frames: source.len(),
                });
            }

            clip.extend_from_slice(&source[start_frame..end_frame]);
        }

        Ok(clip)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn frame_offset(&self, seconds: f64) -> usize {
        (seconds * f64::from(self.sample_rate)).round() as usize
    }
}
