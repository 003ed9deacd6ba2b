use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{Sender, select, tick, unbounded};

use firstream::audio::{AudioPlayback, DeviceSource, ReferenceSignal};
use firstream::config::{CenterFrequency, PipelineConfig};
use firstream::output::{LevelOutput, OutputFormat, create_formatter};
use firstream::scheduler::{Scheduler, SourceMode};
use firstream::signal_processing::FilterEngine;

#[derive(Parser, Debug)]
#[command(name = "firstream")]
#[command(about = "Real-time FIR filtering of live or looped audio", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// WAV file played in looped mode
    #[arg(short = 'r', long)]
    reference: Option<PathBuf>,

    /// Initial filter center (e.g., "0.25", "1000hz")
    #[arg(long)]
    center: Option<CenterFrequency>,

    /// Filter bandwidth in Hz
    #[arg(short = 'b', long)]
    bandwidth: Option<f32>,

    /// Number of filter taps
    #[arg(short = 'n', long)]
    taps: Option<usize>,

    /// Starting mode: live, looped
    #[arg(short = 'm', long, value_enum)]
    mode: Option<SourceMode>,

    /// Level report format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Toggle,
    Center(CenterFrequency),
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };

    match word {
        "t" | "toggle" => Ok(Some(Command::Toggle)),
        "q" | "quit" => Ok(Some(Command::Quit)),
        "c" | "center" => {
            let value = words.next().ok_or("usage: c <0..1 | Nhz>")?;
            Ok(Some(Command::Center(value.parse()?)))
        }
        other => Err(format!("unknown command '{}' (t, c <value>, q)", other)),
    }
}

fn spawn_command_reader(tx: Sender<Command>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("firstream-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if tx.send(command).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
            let _ = tx.send(Command::Quit);
        })
}

fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(center) = args.center {
        config.filter.initial_center = Some(center);
    }
    if let Some(bandwidth) = args.bandwidth {
        config.filter.bandwidth_hz = bandwidth;
    }
    if let Some(taps) = args.taps {
        config.filter.num_taps = taps;
    }
    if let Some(mode) = args.mode {
        config.audio.initial_mode = mode;
    }

    config.validate()?;
    Ok(config)
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

    let config = load_config(&args)?;
    let sample_rate = config.audio.sample_rate as f32;

    println!("=== firstream - real-time FIR filter ===");
    println!("Sample rate: {} Hz", config.audio.sample_rate);
    println!("Frame size: {} samples", config.audio.frame_size);
    println!(
        "Filter: {} taps, {} Hz bandwidth",
        config.filter.num_taps, config.filter.bandwidth_hz
    );
    println!("Commands: t = toggle live/looped, c <0..1 | Nhz> = set center, q = quit");
    println!();

    let engine = FilterEngine::new(config.audio.frame_size, config.initial_coefficients()?)?
        .into_shared();

    let reference = args
        .reference
        .as_ref()
        .map(|path| ReferenceSignal::from_wav(path, config.audio.sample_rate))
        .transpose()?;
    if reference.is_none() {
        log::info!("No reference signal; looped mode will stay silent");
    }

    let (playback, sink) = AudioPlayback::new(&config.audio)?;
    let scheduler = Scheduler::new(engine, sink, reference, &config.meter);
    let updater = scheduler.coefficient_updater();
    scheduler.set_mode(config.audio.initial_mode);

    let worker = scheduler.spawn_loop_worker()?;

    let mut source = DeviceSource::new(&config.audio)?;
    let live = scheduler.clone();
    let live_handle = thread::Builder::new()
        .name("firstream-live".into())
        .spawn(move || live.run_live(&mut source))?;

    let (command_tx, command_rx) = unbounded();
    spawn_command_reader(command_tx)?;

    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let ticker = tick(Duration::from_secs_f32(1.0 / config.meter.report_rate_hz));
    let mut center_hz = config.filter.initial_center.map(|c| c.to_hz(sample_rate));

    loop {
        select! {
            recv(ticker) -> _ => {
                let output = LevelOutput {
                    mode: scheduler.mode(),
                    level_db: scheduler.power_level(),
                    normalized: scheduler.normalized_level(),
                    remaining_chunks: scheduler.remaining_chunks(),
                    center_hz,
                };
                println!("{}", formatter.format(&output));
            }
            recv(command_rx) -> command => match command {
                Ok(Command::Toggle) => {
                    let mode = scheduler.toggle_mode();
                    eprintln!("Mode: {:?}", mode);
                }
                Ok(Command::Center(center)) => {
                    let redesigned = config
                        .filter
                        .spec_for(center, sample_rate)
                        .and_then(|spec| updater.redesign(&spec).map(|()| spec.center_hz()));
                    match redesigned {
                        Ok(hz) => center_hz = Some(hz),
                        Err(e) => eprintln!("{}", e),
                    }
                }
                Ok(Command::Quit) | Err(_) => break,
            },
        }
    }

    worker.shutdown();
    match live_handle.join() {
        Ok(summary) => log::info!(
            "Live path: {} frames played, {} ignored, {} gaps",
            summary.scheduled,
            summary.ignored,
            summary.gaps
        ),
        Err(_) => log::error!("Live thread panicked"),
    }
    drop(playback);

    Ok(())
}
