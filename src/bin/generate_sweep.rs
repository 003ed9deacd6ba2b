use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use firstream::save_wav;
use firstream::simulation::{NoiseConfig, apply_noise, generate_log_sweep};

#[derive(Parser, Debug)]
#[command(name = "generate_sweep")]
#[command(about = "Generate a logarithmic sine sweep WAV to use as a reference signal")]
struct Args {
    /// Output WAV file
    #[arg(default_value = "data/sweep.wav")]
    output: PathBuf,

    /// TOML noise configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sweep duration in seconds
    #[arg(short, long, default_value_t = 5.0)]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Start frequency in Hz
    #[arg(long, default_value_t = 20.0)]
    start_hz: f32,

    /// End frequency in Hz
    #[arg(long, default_value_t = 20000.0)]
    end_hz: f32,

    /// Peak amplitude
    #[arg(long, default_value_t = 0.5)]
    amplitude: f32,

    /// AWGN SNR in dB (CLI override)
    #[arg(long)]
    snr: Option<f32>,

    /// Seed for reproducible noise
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let nyquist = args.sample_rate as f32 / 2.0;
    if args.start_hz <= 0.0 || args.end_hz <= 0.0 || args.end_hz > nyquist {
        anyhow::bail!("Sweep range must be positive and below Nyquist ({} Hz)", nyquist);
    }

    let mut noise = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<NoiseConfig>(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => NoiseConfig::default(),
    };
    if let Some(snr) = args.snr {
        noise = noise.with_awgn(snr);
    }
    if let Some(seed) = args.seed {
        noise = noise.with_seed(seed);
    }

    let mut samples = generate_log_sweep(
        args.duration,
        args.sample_rate,
        args.start_hz,
        args.end_hz,
        args.amplitude,
    );
    apply_noise(&mut samples, &noise, args.sample_rate as f32);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    save_wav(&args.output, &samples, args.sample_rate)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} samples ({} - {} Hz) to {}",
        samples.len(),
        args.start_hz,
        args.end_hz,
        args.output.display()
    );

    Ok(())
}
