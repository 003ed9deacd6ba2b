use firstream::audio::WavFileSource;
use firstream::config::{CenterFrequency, MeterConfig, PipelineConfig};
use firstream::save_wav;
use firstream::scheduler::{ChannelSink, Scheduler};
use firstream::signal_processing::FilterEngine;
use firstream::simulation::{generate_two_tone, signal_power};

const FS: u32 = 44100;
const FRAME: usize = 4410;

fn run_wav_through(config: &PipelineConfig, path: &std::path::Path) -> Vec<f32> {
    let engine = FilterEngine::new(FRAME, config.initial_coefficients().unwrap())
        .unwrap()
        .into_shared();
    let (sink, rx) = ChannelSink::new();
    let scheduler = Scheduler::new(engine, sink, None, &MeterConfig::default());

    let mut source = WavFileSource::new(path, FRAME).unwrap();
    let summary = scheduler.run_live(&mut source);
    assert_eq!(summary.scheduled, 5);
    assert!(scheduler.power_level() > -20.0);

    rx.try_iter()
        .flat_map(|scheduled| scheduled.frame.into_samples())
        .collect()
}

#[test]
fn test_bandpass_isolates_one_tone_from_wav() {
    let path =
        std::env::temp_dir().join(format!("firstream_two_tone_{}.wav", std::process::id()));
    let input = generate_two_tone(FRAME * 5, FS as f32, 1000.0, 6000.0, 1.0);
    save_wav(&path, &input, FS).unwrap();

    let mut config = PipelineConfig::default();
    let passthrough = run_wav_through(&config, &path);

    config.filter.num_taps = 255;
    config.filter.bandwidth_hz = 500.0;
    config.filter.initial_center = Some(CenterFrequency::Hz(1000.0));
    let filtered = run_wav_through(&config, &path);
    let _ = std::fs::remove_file(&path);

    assert_eq!(passthrough, input);
    assert_eq!(filtered.len(), input.len());

    // Two tones of 0.5 carry 0.25 of power; one alone carries 0.125
    let settled = &filtered[1000..];
    assert!((signal_power(&input) - 0.25).abs() < 0.01);
    assert!(
        (signal_power(settled) - 0.125).abs() < 0.005,
        "filtered power {}",
        signal_power(settled)
    );
}
