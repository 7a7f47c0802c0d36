use std::path::PathBuf;

use clap::{Parser, Subcommand};
use launchbench::capture::PrerecordedDriver;
use launchbench::report::{JsonLinesSink, LogSink};
use launchbench::{
    BootTimeError, BootTimeHarness, BoundaryDetector, Configuration, FrameSequence, SsimOracle,
};
use tracing::Level;

/// Launch latency from screen recordings
#[derive(Parser)]
#[command(name = "launchbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "LAUNCHBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute boot time from an existing directory of numbered frames
    Analyze {
        /// Directory of zero-padded frame images
        #[arg(long)]
        frames: PathBuf,

        /// Image of the fully rendered app
        #[arg(long)]
        reference: PathBuf,

        /// Frames per second the frames were sampled at
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Decode a recorded launch video and measure it
    Replay {
        /// Recorded launch video
        #[arg(long)]
        video: PathBuf,

        /// Image of the fully rendered app, defaults to <reference_dir>/<app>/end.png
        #[arg(long)]
        reference: Option<PathBuf>,

        /// App name used for the session directory
        #[arg(long)]
        app: Option<String>,

        /// Append the result as a JSON line to this file
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), BootTimeError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let configuration = Configuration::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            frames,
            reference,
            fps,
        } => analyze(configuration, frames, reference, fps),
        Commands::Replay {
            video,
            reference,
            app,
            results,
        } => replay(configuration, video, reference, app, results).await,
    }
}

fn analyze(
    configuration: Configuration,
    frames_dir: PathBuf,
    reference: PathBuf,
    fps: Option<u32>,
) -> Result<(), BootTimeError> {
    let fps = fps.unwrap_or(configuration.decoder.fps);
    let frames = FrameSequence::from_dir(&frames_dir, &configuration.decoder.frame_extension)?;
    let oracle = SsimOracle::new().with_max_width(configuration.similarity.max_width);
    let detector = BoundaryDetector::new(oracle, &configuration.detection);

    let measurement = detector
        .compute_boot_time(&frames, fps, &reference)?
        .into_result()?;
    if measurement.boot_time_ms == 0 {
        return Err(BootTimeError::NonPositiveBootTime);
    }

    println!("{}", measurement.boot_time_ms);
    Ok(())
}

async fn replay(
    mut configuration: Configuration,
    video: PathBuf,
    reference: Option<PathBuf>,
    app: Option<String>,
    results: Option<PathBuf>,
) -> Result<(), BootTimeError> {
    if let Some(app) = app {
        configuration = configuration.with_app_name(app);
    }
    // the launch is already on disk
    configuration.capture.pre_launch_delay_ms = 0;
    configuration.capture.settle_time_ms = 0;

    let mut builder = BootTimeHarness::builder(configuration)
        .driver(Box::new(PrerecordedDriver::new(video)))
        .sink(Box::new(LogSink));
    if let Some(reference) = reference {
        builder = builder.reference_end(reference);
    }
    if let Some(results) = results {
        builder = builder.sink(Box::new(JsonLinesSink::new(results)));
    }

    let record = builder.build()?.run().await?;
    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| BootTimeError::Sink(format!("Failed to serialize record: {e}")))?;
    println!("{json}");
    Ok(())
}
