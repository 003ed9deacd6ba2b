use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_impulse(mut self, rate_hz: f32, amplitude: f32) -> Self {
        self.impulse = Some(ImpulseNoiseConfig { rate_hz, amplitude });
        self
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

/// Single-sample clicks of random sign at an average rate
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    pub rate_hz: f32,
    pub amplitude: f32,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f32>() / signal.len() as f32
}

/// Apply every configured impairment to `signal` in place
pub fn apply_noise(signal: &mut [f32], config: &NoiseConfig, sample_rate: f32) {
    let mut rng = create_rng(config.seed);

    if let Some(additive) = &config.additive {
        apply_additive_noise(signal, additive, &mut rng);
    }
    if let Some(impulse) = &config.impulse {
        apply_impulse_noise(signal, impulse, sample_rate, &mut rng);
    }
}

fn apply_additive_noise(signal: &mut [f32], config: &AdditiveNoiseConfig, rng: &mut ChaCha8Rng) {
    let sig_power = signal_power(signal);
    if sig_power == 0.0 {
        return;
    }

    let snr_linear = 10.0_f32.powf(config.snr_db / 10.0);
    let noise_std = (sig_power / snr_linear).sqrt();

    let Ok(normal) = Normal::new(0.0, noise_std as f64) else {
        log::warn!("Invalid noise deviation {}", noise_std);
        return;
    };

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng) as f32;
    }
}

fn apply_impulse_noise(
    signal: &mut [f32],
    config: &ImpulseNoiseConfig,
    sample_rate: f32,
    rng: &mut ChaCha8Rng,
) {
    if config.rate_hz <= 0.0 {
        return;
    }

    let avg_spacing = sample_rate / config.rate_hz;
    let mut position = 0usize;

    loop {
        let interval = (rng.random::<f32>() * 2.0 * avg_spacing) as usize;
        position += interval.max(1);
        if position >= signal.len() {
            break;
        }
        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        signal[position] += sign * config.amplitude;
    }
}
