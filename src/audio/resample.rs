//! Resampling from the capture rate to the model's expected rate.

use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Resample mono audio to the target sample rate.
///
/// Returns the input unchanged if already at the target rate. Used to bridge
/// the fixed 16 kHz capture format to whatever rate the loaded model expects.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples);
    }

    const CHUNK_SIZE: usize = 1024;
    const SUB_CHUNKS: usize = 1;
    const CHANNELS: usize = 1;

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        CHANNELS,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let frames_per_chunk = resampler.input_frames_next();
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let estimated =
        ((samples.len() as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize;
    let mut output = Vec::with_capacity(estimated + CHUNK_SIZE);

    let mut pos = 0;
    while pos + frames_per_chunk <= samples.len() {
        let resampled = process_chunk(&mut resampler, &samples[pos..pos + frames_per_chunk])?;
        output.extend_from_slice(&resampled);
        pos += frames_per_chunk;
    }

    // Final partial chunk: pad with silence, keep only the proportional output.
    if pos < samples.len() {
        let remaining = samples.len() - pos;
        let mut padded = samples[pos..].to_vec();
        padded.resize(frames_per_chunk, 0.0);

        let resampled = process_chunk(&mut resampler, &padded)?;

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let wanted =
            (remaining as f64 * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize;
        output.extend_from_slice(&resampled[..wanted.min(resampled.len())]);
    }

    Ok(output)
}

fn process_chunk(resampler: &mut Fft<f32>, chunk: &[f32]) -> Result<Vec<f32>> {
    let adapter = SequentialSlice::new(chunk, 1, chunk.len()).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&adapter, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;

    Ok(resampled.take_data())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate_returns_input() {
        let samples = vec![0.25, -0.25, 0.5, -0.5];
        let result = resample(samples.clone(), 16_000, 16_000).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn test_resample_capture_rate_to_model_rate() {
        // One second of a slow sine at the 16 kHz capture rate.
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..16_000).map(|i| (i as f32 * 0.002).sin()).collect();
        let output = resample(samples, 16_000, 48_000).unwrap();
        // Roughly 3x the length.
        assert!(output.len() > 44_000);
        assert!(output.len() < 52_000);
    }

    #[test]
    fn test_resample_downsample() {
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..32_000).map(|i| (i as f32 * 0.001).sin()).collect();
        let output = resample(samples, 32_000, 16_000).unwrap();
        assert!(output.len() > 14_000);
        assert!(output.len() < 18_000);
    }
}
