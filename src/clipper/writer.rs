//! WAV clip writing.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::constants::capture::CHANNELS;
use crate::error::{Error, Result};

/// Writes evidence clips as 16-bit mono WAV files.
pub struct ClipWriter {
    output_dir: PathBuf,
}

impl ClipWriter {
    /// Create a clip writer, creating the output directory if needed.
    ///
    /// An uncreatable directory is a startup-time configuration error.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&output_dir).map_err(|e| Error::OutputDirCreateFailed {
            path: output_dir.clone(),
            source: e,
        })?;

        Ok(Self { output_dir })
    }

    /// Write clip samples to `<species>_<unix timestamp>.wav`.
    ///
    /// The output shares the source window's channel count, sample width,
    /// and frame rate.
    pub fn write_clip(
        &self,
        samples: &[i16],
        sample_rate: u32,
        common_name: &str,
    ) -> Result<PathBuf> {
        let filename = format!(
            "{}_{}.wav",
            sanitize_filename(common_name).replace(' ', "_"),
            Utc::now().timestamp()
        );
        let output_path = self.output_dir.join(filename);

        write_wav_file(&output_path, samples, sample_rate)?;

        Ok(output_path)
    }
}

/// Sanitize a string for use as a filename.
///
/// Replaces characters that are invalid in filenames across platforms
/// and prevents path traversal.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    sanitized.replace("..", "__")
}

fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| Error::WavWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("House Sparrow"), "House Sparrow");
        assert_eq!(sanitize_filename("a/b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_filename("file?name"), "file_name");
    }

    #[test]
    fn test_sanitize_filename_prevents_path_traversal() {
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename("../etc"), "___etc");
        // Single dots survive (species abbreviations).
        assert_eq!(sanitize_filename("sp."), "sp.");
    }
}
