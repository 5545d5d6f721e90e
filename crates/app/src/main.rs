use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use clap::{Args, Parser, Subcommand};
use radial_visualiser_core::{
    AppConfig, FrameOrchestrator, FrameSink, Recorder, RecordingSettings, Result, VisualState,
};
use tracing_subscriber::EnvFilter;

mod decode;

/// Consecutive failed ticks tolerated before a run is abandoned.
const MAX_CONSECUTIVE_FAILURES: u32 = 8;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live { pipeline } => run_live(&pipeline),
        Commands::Precompute { pipeline, output } => run_precompute(&pipeline, &output),
    }
}

fn run_live(args: &PipelineArgs) -> Result<()> {
    let config = load_config(args)?;
    let buffer = decode::load_wav(&args.input)?;
    let frames = args.frames.unwrap_or_else(|| frames_per_pass(buffer.len(), &config));
    tracing::info!(input = ?args.input, frames, fps = args.fps, "starting live mode");

    let mut orchestrator = FrameOrchestrator::new(buffer, &config)?;
    let mut sink = LogSink::new(args.fps);
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let mut failures = 0;

    for _ in 0..frames {
        let started = Instant::now();
        match orchestrator.tick() {
            Ok(state) => {
                failures = 0;
                sink.present(state)?;
            }
            Err(err) => {
                failures += 1;
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    return Err(err);
                }
            }
        }

        // Stand-in for vsync: the core never paces itself.
        if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    sink.summary();
    Ok(())
}

fn run_precompute(args: &PipelineArgs, output: &Path) -> Result<()> {
    let config = load_config(args)?;
    let buffer = decode::load_wav(&args.input)?;
    let frames = args.frames.unwrap_or_else(|| frames_per_pass(buffer.len(), &config));
    tracing::info!(input = ?args.input, ?output, frames, "running precompute pipeline");

    let mut orchestrator = FrameOrchestrator::new(buffer, &config)?;
    let mut recorder = Recorder::new(RecordingSettings {
        output_path: output.to_path_buf(),
        fps: args.fps,
    });
    let delta = 1.0 / args.fps as f32;

    recorder.start();
    for _ in 0..frames {
        let state = orchestrator.tick_with_delta(delta)?;
        recorder.present(state)?;
    }
    recorder.finish()?;
    Ok(())
}

fn load_config(args: &PipelineArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Ticks needed for the cursor to walk the buffer once before wrapping.
fn frames_per_pass(samples: usize, config: &AppConfig) -> u64 {
    let window = config.analysis.window_size;
    let hop = config.analysis.hop_size().max(1);
    (samples.saturating_sub(window) / hop + 1) as u64
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Headless stand-in for a renderer: reports a short summary once a second.
#[derive(Debug)]
struct LogSink {
    fps: u32,
    frames: u64,
    emitted: usize,
    peak_particles: usize,
}

impl LogSink {
    fn new(fps: u32) -> Self {
        Self {
            fps,
            frames: 0,
            emitted: 0,
            peak_particles: 0,
        }
    }

    fn summary(&self) {
        tracing::info!(
            frames = self.frames,
            emitted = self.emitted,
            peak_particles = self.peak_particles,
            "live run finished"
        );
    }
}

impl FrameSink for LogSink {
    fn present(&mut self, state: &VisualState) -> Result<()> {
        self.frames += 1;
        self.emitted += state.emitted;
        self.peak_particles = self.peak_particles.max(state.particles.len());

        if self.frames % u64::from(self.fps) == 0 {
            let bars = state.bar_heights.as_slice();
            let loudest = bars
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(index, _)| index);
            let mean = bars.iter().sum::<f32>() / bars.len().max(1) as f32;
            tracing::info!(
                frame = state.frame_index,
                cursor = state.cursor,
                mean_height = mean,
                loudest_bar = ?loudest,
                particles = state.particles.len(),
                "frame"
            );
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive radial spectrum visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline against the wall clock and log what it produces.
    Live {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Run the pipeline at a fixed time step and store every frame as JSON.
    Precompute {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Output path for the recorded frames.
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// WAV file to analyse.
    input: PathBuf,
    /// JSON configuration file. Defaults apply to anything it leaves out.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for particle emission; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to run. Defaults to one pass over the input.
    #[arg(long)]
    frames: Option<u64>,
    /// Target frame rate.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
}
