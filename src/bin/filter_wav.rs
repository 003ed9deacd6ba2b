use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;

use firstream::audio::{FrameSource, WavFileSource};
use firstream::config::{CenterFrequency, PipelineConfig};
use firstream::save_wav;
use firstream::signal_processing::{FilterEngine, level_db, magnitude_db};

#[derive(Parser, Debug)]
#[command(name = "filter_wav")]
#[command(about = "Run a WAV file through the streaming FIR filter", long_about = None)]
struct Args {
    /// Input WAV file (first channel is used)
    input: PathBuf,

    /// Output WAV file (mono, 32-bit float)
    output: PathBuf,

    /// Filter center (e.g., "0.25", "1000hz")
    #[arg(long, default_value = "1000hz")]
    center: CenterFrequency,

    /// Sweep the center linearly from --center to this value across the file
    #[arg(long)]
    sweep_to: Option<CenterFrequency>,

    /// Filter bandwidth in Hz
    #[arg(short = 'b', long, default_value_t = 200.0)]
    bandwidth: f32,

    /// Number of filter taps
    #[arg(short = 'n', long, default_value_t = 256)]
    taps: usize,

    /// Samples per frame
    #[arg(long, default_value_t = 4410)]
    frame_size: usize,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Serialize)]
struct LevelSummary {
    count: usize,
    mean_db: f32,
    std_dev_db: f32,
    min_db: f32,
    max_db: f32,
}

impl LevelSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean_db: stats.mean,
            std_dev_db: stats.std_dev,
            min_db: stats.min,
            max_db: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FilterReport {
    input: String,
    output: String,
    sample_rate: u32,
    samples: usize,
    frames: usize,
    coefficient_sets: u64,
    final_center_hz: f32,
    response_at_center_db: f32,
    input_level: Option<LevelSummary>,
    output_level: Option<LevelSummary>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut source = WavFileSource::new(&args.input, args.frame_size)?;
    let sample_rate = source.sample_rate();
    let fs = sample_rate as f32;

    let mut config = PipelineConfig::default();
    config.audio.sample_rate = sample_rate;
    config.audio.frame_size = args.frame_size;
    config.filter.bandwidth_hz = args.bandwidth;
    config.filter.num_taps = args.taps;
    config.filter.initial_center = Some(args.center);
    config.validate()?;

    let mut engine = FilterEngine::new(args.frame_size, config.initial_coefficients()?)?;
    let updater = engine.coefficient_updater();

    let total_frames = source.len().div_ceil(args.frame_size);
    let start_hz = args.center.to_hz(fs);
    let end_hz = args.sweep_to.map(|c| c.to_hz(fs));
    let mut center_hz = start_hz;

    let floor_db = config.meter.floor_db;
    let mut input_stats: Stats<f32> = Stats::new();
    let mut output_stats: Stats<f32> = Stats::new();
    let mut filtered = Vec::with_capacity(source.len());
    let mut frames = 0usize;

    while let Some(frame) = source.next_frame()? {
        if let Some(end_hz) = end_hz.filter(|_| frames > 0) {
            let progress = frames as f32 / total_frames.max(1) as f32;
            center_hz = start_hz + (end_hz - start_hz) * progress;
            let spec = config
                .filter
                .spec_for(CenterFrequency::Hz(center_hz), fs)
                .context("Sweep left the valid center range")?;
            updater.redesign(&spec)?;
        }

        let output = engine.filter_frame(&frame)?;
        input_stats.update(level_db(frame.as_slice(), floor_db));
        output_stats.update(level_db(output.as_slice(), floor_db));
        filtered.extend_from_slice(output.as_slice());
        frames += 1;
    }

    save_wav(&args.output, &filtered, sample_rate)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let report = FilterReport {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        sample_rate,
        samples: filtered.len(),
        frames,
        coefficient_sets: engine.generation() + 1,
        final_center_hz: center_hz,
        response_at_center_db: magnitude_db(engine.taps(), center_hz, fs),
        input_level: LevelSummary::from_stats(&input_stats),
        output_level: LevelSummary::from_stats(&output_stats),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &FilterReport) {
    println!("{} -> {}", report.input, report.output);
    println!(
        "  {} samples at {} Hz in {} frames, {} coefficient set(s)",
        report.samples, report.sample_rate, report.frames, report.coefficient_sets
    );
    println!(
        "  Center {:.1} Hz, response at center {:.2} dB",
        report.final_center_hz, report.response_at_center_db
    );
    for (label, level) in [("Input", &report.input_level), ("Output", &report.output_level)] {
        match level {
            Some(level) => println!(
                "  {} level: mean {:.1} dB (std {:.1}), min {:.1} dB, max {:.1} dB",
                label, level.mean_db, level.std_dev_db, level.min_db, level.max_db
            ),
            None => println!("  {} level: no frames", label),
        }
    }
}
