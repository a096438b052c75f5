//! PCM audio plumbing.
//!
//! The capture source delivers raw signed 16-bit little-endian mono PCM.
//! This module converts that byte stream into samples, normalizes samples
//! for inference, and cuts audio into fixed-duration classifier segments.

mod resample;

pub use resample::resample;

/// A fixed-duration segment of audio with its window-relative time offsets.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Normalized samples for this segment (zero-padded to full length).
    pub samples: Vec<f32>,
    /// Start time in seconds, relative to the window start.
    pub start_time: f64,
    /// End time in seconds, clamped to the actual audio duration.
    pub end_time: f64,
}

/// Convert raw s16le PCM bytes into samples.
///
/// A trailing odd byte (torn sample from an interrupted stream) is dropped.
pub fn samples_from_pcm_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Normalize i16 samples to f32 in [-1.0, 1.0) for inference.
pub fn normalize(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| f32::from(s) / -f32::from(i16::MIN))
        .collect()
}

/// Cut audio into consecutive fixed-duration segments.
///
/// The final segment is zero-padded to full length, but its `end_time` stays
/// clamped to the real audio duration so downstream time ranges never point
/// past the source window.
pub fn segment_audio(samples: &[f32], sample_rate: u32, segment_duration: f32) -> Vec<Segment> {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let segment_samples = (segment_duration * sample_rate as f32) as usize;
    if segment_samples == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let audio_duration = samples.len() as f64 / f64::from(sample_rate);

    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < samples.len() {
        let end = (pos + segment_samples).min(samples.len());
        let mut data = samples[pos..end].to_vec();
        data.resize(segment_samples, 0.0);

        #[allow(clippy::cast_precision_loss)]
        let start_time = pos as f64 / f64::from(sample_rate);
        let end_time = (start_time + f64::from(segment_duration)).min(audio_duration);

        segments.push(Segment {
            samples: data,
            start_time,
            end_time,
        });

        pos += segment_samples;
    }

    segments
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_from_pcm_bytes() {
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80];
        let samples = samples_from_pcm_bytes(&bytes);
        assert_eq!(samples, vec![0, i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_samples_from_pcm_bytes_drops_torn_sample() {
        let bytes = [0x01, 0x00, 0x02];
        let samples = samples_from_pcm_bytes(&bytes);
        assert_eq!(samples, vec![1]);
    }

    #[test]
    fn test_normalize_bounds() {
        let normalized = normalize(&[i16::MIN, 0, i16::MAX]);
        assert_eq!(normalized[0], -1.0);
        assert_eq!(normalized[1], 0.0);
        assert!(normalized[2] < 1.0);
    }

    #[test]
    fn test_segment_audio_exact_fit() {
        let samples = vec![0.0; 96_000]; // 6 seconds at 16 kHz
        let segments = segment_audio(&samples, 16_000, 3.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments[0].end_time, 3.0);
        assert_eq!(segments[1].start_time, 3.0);
        assert_eq!(segments[1].end_time, 6.0);
    }

    #[test]
    fn test_segment_audio_pads_final_segment_but_clamps_time() {
        let samples = vec![0.0; 64_000]; // 4 seconds at 16 kHz
        let segments = segment_audio(&samples, 16_000, 3.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].samples.len(), 48_000);
        // Padded to 3s of samples, but the time range ends at the real 4s mark.
        assert_eq!(segments[1].end_time, 4.0);
    }

    #[test]
    fn test_segment_audio_empty_input() {
        let segments = segment_audio(&[], 16_000, 3.0);
        assert!(segments.is_empty());
    }
}
