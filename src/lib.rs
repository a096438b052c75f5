//! Feathercast - continuous bird species detection from live audio streams.
//!
//! Samples fixed-duration windows from a stream, classifies them with a
//! `BirdNET` model, consolidates raw hits into per-species detection events
//! with evidence clips, and persists them for recency queries.

#![warn(missing_docs)]

pub mod audio;
pub mod capture;
pub mod cli;
pub mod clipper;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{CommandFactory, Parser};
use tracing::{info, warn};

use capture::FfmpegCapture;
use cli::{Cli, Command, ConfigAction, RecentArgs, RunArgs};
use clipper::{ClipWriter, DetectionGrouper};
use config::{Config, InferenceDevice, load_default_config};
use constants::capture::SAMPLE_RATE;
use constants::grouping::MERGE_TOLERANCE_SECS;
use constants::DEFAULT_TOP_K;
use inference::{BirdClassifier, ClassifierHints};
use pipeline::{SamplingLoop, SamplingOptions};
use store::DetectionStore;

pub use error::{Error, Result};

/// Main entry point for the feathercast CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.run.verbose, cli.run.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    let Some(stream_url) = cli.stream_url else {
        // No stream, no subcommand: show usage instead of erroring.
        let _ = Cli::command().print_help();
        return Ok(());
    };
    let sample_duration = cli.sample_duration.ok_or_else(|| Error::ConfigValidation {
        message: "sample duration (seconds) is required after the stream address".to_string(),
    })?;

    run_sampling(&stream_url, sample_duration, &cli.run, &config)
}

/// Resolve settings, build the pipeline, and run it until interrupted.
fn run_sampling(
    stream_url: &str,
    sample_duration: u32,
    args: &RunArgs,
    config: &Config,
) -> Result<()> {
    let min_confidence = args
        .min_confidence
        .unwrap_or(config.defaults.min_confidence);
    let latitude = args.latitude.or(config.defaults.latitude);
    let longitude = args.longitude.or(config.defaults.longitude);
    let database = args
        .database
        .clone()
        .unwrap_or_else(|| config.defaults.database.clone());
    let clip_dir = if args.no_clips {
        None
    } else {
        args.clip_dir.clone().or_else(|| config.defaults.clip_dir.clone())
    };

    let (model_path, labels_path) = resolve_model_paths(args, config)?;

    let device = if args.gpu {
        InferenceDevice::Gpu
    } else if args.cpu {
        InferenceDevice::Cpu
    } else {
        config.inference.device
    };

    // Shutdown flag, observed by the loop at iteration boundaries.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
        }) {
            warn!("Failed to install Ctrl+C handler: {e}");
        }
    }

    birdnet_onnx::init_runtime().map_err(|e| Error::RuntimeInitialization {
        reason: e.to_string(),
    })?;

    info!("Loading model: {}", model_path.display());
    let classifier = Arc::new(BirdClassifier::new(
        &model_path,
        &labels_path,
        device,
        min_confidence,
        DEFAULT_TOP_K,
    )?);

    // Clip directory problems are configuration errors; fail before looping.
    let clip_writer = clip_dir.map(ClipWriter::new).transpose()?;
    let grouper = DetectionGrouper::new(MERGE_TOLERANCE_SECS, SAMPLE_RATE, clip_writer);
    let capture = Arc::new(FfmpegCapture::new(stream_url));

    let options = SamplingOptions {
        sample_duration,
        hints: ClassifierHints {
            latitude,
            longitude,
            date: Some(chrono::Utc::now().date_naive()),
        },
        min_confidence,
    };

    info!(
        "Sampling {}s windows from '{}' (min confidence {:.2})",
        sample_duration, stream_url, min_confidence
    );

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    runtime.block_on(async {
        let store = DetectionStore::open(&database).await?;
        store.init().await?;

        SamplingLoop::new(capture, classifier, grouper, store, options, cancel)
            .run()
            .await
    })
}

/// Model and labels paths: CLI overrides config; both are required.
fn resolve_model_paths(args: &RunArgs, config: &Config) -> Result<(PathBuf, PathBuf)> {
    let model_path = args
        .model_path
        .clone()
        .or_else(|| config.model.as_ref().map(|m| m.path.clone()))
        .ok_or_else(|| Error::ConfigValidation {
            message: "no model configured (use --model-path or set [model] in config)".to_string(),
        })?;
    let labels_path = args
        .labels_path
        .clone()
        .or_else(|| config.model.as_ref().map(|m| m.labels.clone()))
        .ok_or_else(|| Error::ConfigValidation {
            message: "no labels configured (use --labels-path or set [model] in config)"
                .to_string(),
        })?;

    Ok((model_path, labels_path))
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; -v raises it together with ours.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
        Command::Recent(args) => handle_recent_command(&args, config),
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config::config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = config::save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config::config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Query the store for each species' most recent detection and print it.
fn handle_recent_command(args: &RecentArgs, config: &Config) -> Result<()> {
    let database = args
        .database
        .clone()
        .unwrap_or_else(|| config.defaults.database.clone());
    let min_confidence = args
        .min_confidence
        .unwrap_or(config.defaults.min_confidence);
    let window = chrono::Duration::hours(i64::from(args.window_hours));

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    let records = runtime.block_on(async {
        let store = DetectionStore::open(&database).await?;
        store.init().await?;
        store.query_recent(args.limit, min_confidence, window).await
    })?;

    if records.is_empty() {
        println!("No detections within the last {} hour(s).", args.window_hours);
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!(
            "{i}: {} ({}) - Confidence: {:.2} | File: {} | Time: {:.1}-{:.1} ({})",
            record.common_name,
            record.scientific_name,
            record.confidence,
            record.file_path.as_deref().unwrap_or("-"),
            record.start_time,
            record.end_time,
            record.timestamp,
        );
    }

    Ok(())
}
