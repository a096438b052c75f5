//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Continuous bird species detection from live audio streams.
#[derive(Debug, Parser)]
#[command(name = "feathercast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Stream address to sample (e.g. an RTSP URL).
    pub stream_url: Option<String>,

    /// Duration of each sampling window in seconds.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub sample_duration: Option<u32>,

    /// Common options for the sampling loop.
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show the most recent detection per species.
    Recent(RecentArgs),
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the sampling loop.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Latitude hint for the classifier (-90.0 to 90.0).
    #[arg(long, value_parser = parse_latitude, env = "FEATHERCAST_LATITUDE")]
    pub latitude: Option<f64>,

    /// Longitude hint for the classifier (-180.0 to 180.0).
    #[arg(long, value_parser = parse_longitude, env = "FEATHERCAST_LONGITUDE")]
    pub longitude: Option<f64>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "FEATHERCAST_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Directory for extracted evidence clips.
    #[arg(long, env = "FEATHERCAST_CLIP_DIR", conflicts_with = "no_clips")]
    pub clip_dir: Option<PathBuf>,

    /// Disable evidence clip extraction entirely.
    #[arg(long)]
    pub no_clips: bool,

    /// SQLite database path.
    #[arg(long, env = "FEATHERCAST_DATABASE")]
    pub database: Option<PathBuf>,

    /// Path to the ONNX model file (overrides config).
    #[arg(long, env = "FEATHERCAST_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to the labels file (overrides config).
    #[arg(long, env = "FEATHERCAST_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Enable GPU acceleration.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,

    /// Suppress informational output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the `recent` query subcommand.
#[derive(Debug, Args)]
pub struct RecentArgs {
    /// Maximum number of species to show.
    #[arg(short, long, default_value_t = crate::constants::query::DEFAULT_LIMIT)]
    pub limit: u32,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence)]
    pub min_confidence: Option<f32>,

    /// Trailing window in hours.
    #[arg(long, default_value_t = 24)]
    pub window_hours: u32,

    /// SQLite database path.
    #[arg(long, env = "FEATHERCAST_DATABASE")]
    pub database: Option<PathBuf>,
}

/// Parse and validate latitude value.
fn parse_latitude(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(-90.0..=90.0).contains(&value) {
        return Err(format!(
            "latitude must be between -90.0 and 90.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate longitude value.
fn parse_longitude(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(-180.0..=180.0).contains(&value) {
        return Err(format!(
            "longitude must be between -180.0 and 180.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate confidence value.
fn parse_confidence(s: &str) -> Result<f32, String> {
    use crate::constants::confidence;

    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(confidence::MIN..=confidence::MAX).contains(&value) {
        return Err(format!(
            "confidence must be between {:.1} and {:.1}, got {value}",
            confidence::MIN,
            confidence::MAX
        ));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confidence_valid() {
        assert_eq!(parse_confidence("0.5").ok(), Some(0.5));
        assert_eq!(parse_confidence("0.0").ok(), Some(0.0));
        assert_eq!(parse_confidence("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_confidence_invalid() {
        assert!(parse_confidence("1.5").is_err());
        assert!(parse_confidence("-0.1").is_err());
        assert!(parse_confidence("abc").is_err());
    }

    #[test]
    fn test_parse_latitude_bounds() {
        assert_eq!(parse_latitude("90.0").ok(), Some(90.0));
        assert_eq!(parse_latitude("-90.0").ok(), Some(-90.0));
        assert!(parse_latitude("91.0").is_err());
        assert!(parse_latitude("-91.0").is_err());
    }

    #[test]
    fn test_parse_longitude_bounds() {
        assert_eq!(parse_longitude("180.0").ok(), Some(180.0));
        assert_eq!(parse_longitude("-180.0").ok(), Some(-180.0));
        assert!(parse_longitude("181.0").is_err());
        assert!(parse_longitude("-181.0").is_err());
    }

    #[test]
    fn test_cli_parse_stream_and_duration() {
        let cli = Cli::try_parse_from(["feathercast", "rtsp://cam.local/stream", "30"]).unwrap();
        assert_eq!(
            cli.stream_url,
            Some("rtsp://cam.local/stream".to_string())
        );
        assert_eq!(cli.sample_duration, Some(30));
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::try_parse_from([
            "feathercast",
            "rtsp://cam.local/stream",
            "30",
            "--latitude=35.95",
            "--longitude=-79.31",
            "-c",
            "0.4",
            "-q",
        ])
        .unwrap();
        assert_eq!(cli.run.latitude, Some(35.95));
        assert_eq!(cli.run.longitude, Some(-79.31));
        assert_eq!(cli.run.min_confidence, Some(0.4));
        assert!(cli.run.quiet);
    }

    #[test]
    fn test_cli_parse_rejects_zero_duration() {
        assert!(Cli::try_parse_from(["feathercast", "rtsp://cam.local/stream", "0"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["feathercast", "config", "show"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_parse_recent_subcommand() {
        let cli =
            Cli::try_parse_from(["feathercast", "recent", "--limit", "10", "-c", "0.5"]).unwrap();
        let Some(Command::Recent(args)) = cli.command else {
            panic!("expected recent subcommand");
        };
        assert_eq!(args.limit, 10);
        assert_eq!(args.min_confidence, Some(0.5));
        assert_eq!(args.window_hours, 24);
    }

    #[test]
    fn test_cli_clip_dir_conflicts_with_no_clips() {
        assert!(
            Cli::try_parse_from([
                "feathercast",
                "rtsp://cam.local/stream",
                "30",
                "--clip-dir",
                "clips",
                "--no-clips",
            ])
            .is_err()
        );
    }
}
