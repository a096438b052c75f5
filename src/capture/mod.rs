//! Live stream audio capture.
//!
//! Capture is an external, potentially failing resource. Each window acquires
//! the subprocess fresh (spawn, bounded read, terminate) instead of holding a
//! long-lived handle, trading spawn overhead for failure isolation: a dead or
//! stalled stream costs one window, never the process. Reads carry a deadline
//! of the requested duration plus slack, so a stream that stalls without
//! closing cannot hold an iteration past its window.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::audio::samples_from_pcm_bytes;
use crate::constants::capture::{BYTES_PER_SAMPLE, READ_DEADLINE_SLACK, SAMPLE_RATE};
use crate::error::{Error, Result};

const READ_CHUNK_BYTES: usize = 8192;

/// A source of fixed-duration audio windows.
///
/// Implementations return up to `duration_secs` worth of signed 16-bit mono
/// samples at 16 kHz, within a bounded amount of time. Short or empty results
/// indicate stream interruption and are not an error at this layer.
pub trait CaptureSource: Send + Sync {
    /// Capture one window of at most `duration_secs` seconds of audio.
    fn capture_window(&self, duration_secs: u32) -> Result<Vec<i16>>;
}

/// Captures audio by piping a stream through an ffmpeg subprocess.
///
/// ffmpeg handles the stream transport (RTSP or anything else it speaks) and
/// emits raw s16le mono PCM at 16 kHz on stdout; we only rely on the
/// byte-count contract.
pub struct FfmpegCapture {
    stream_url: String,
}

impl FfmpegCapture {
    /// Create a capture source for the given stream address.
    #[must_use]
    pub fn new(stream_url: impl Into<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
        }
    }

    fn spawn(&self) -> Result<Child> {
        Command::new("ffmpeg")
            .args([
                "-i",
                &self.stream_url,
                "-f",
                "s16le",
                "-ac",
                "1",
                "-ar",
                "16000",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::CaptureSpawn {
                command: "ffmpeg".to_string(),
                source: e,
            })
    }
}

impl CaptureSource for FfmpegCapture {
    fn capture_window(&self, duration_secs: u32) -> Result<Vec<i16>> {
        let want = SAMPLE_RATE as usize * BYTES_PER_SAMPLE * duration_secs as usize;
        let deadline = Duration::from_secs(u64::from(duration_secs)) + READ_DEADLINE_SLACK;

        let mut child = self.spawn()?;
        let read_result = match child.stdout.take() {
            Some(stdout) => read_up_to_deadline(stdout, want, deadline),
            None => Err(Error::Internal {
                message: "capture process spawned without stdout pipe".to_string(),
            }),
        };

        // Terminate the subprocess on every path, including short, failed,
        // and expired reads, so no ffmpeg instance outlives its window.
        // Killing the child also closes the pipe, which unblocks a reader
        // thread left parked by an expired deadline.
        terminate(&mut child);

        let bytes = read_result?;
        if bytes.len() < want {
            debug!(
                "short capture read: {} of {} bytes from '{}'",
                bytes.len(),
                want,
                self.stream_url
            );
        }

        Ok(samples_from_pcm_bytes(&bytes))
    }
}

/// Read up to `want` bytes, stopping at EOF or when `deadline` elapses.
///
/// The blocking reads run on a helper thread feeding a bounded channel, so a
/// source that stalls without reaching EOF cannot hold the caller past the
/// deadline; whatever arrived by then is returned. On expiry the helper
/// thread stays parked in its read and exits once the source closes.
fn read_up_to_deadline(
    reader: impl Read + Send + 'static,
    want: usize,
    deadline: Duration,
) -> Result<Vec<u8>> {
    let (tx, rx) = mpsc::sync_channel::<std::io::Result<Vec<u8>>>(1);

    thread::spawn(move || {
        let mut reader = reader;
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });

    let expiry = Instant::now() + deadline;
    let mut bytes = Vec::with_capacity(want);

    while bytes.len() < want {
        let remaining = expiry.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(
                "capture read deadline elapsed with {} of {} bytes",
                bytes.len(),
                want
            );
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(Ok(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(Err(e)) => return Err(Error::CaptureRead { source: e }),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    "capture read deadline elapsed with {} of {} bytes",
                    bytes.len(),
                    want
                );
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    bytes.truncate(want);
    Ok(bytes)
}

/// Kill and reap the capture subprocess.
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        // Already exited is fine; anything else is worth a log line.
        if e.kind() != std::io::ErrorKind::InvalidInput {
            warn!("failed to kill capture process: {e}");
        }
    }
    if let Err(e) = child.wait() {
        warn!("failed to reap capture process: {e}");
    }
}
