//! Synthetic test signals for exercising the pipeline without audio
//! hardware.

mod noise;
mod signal;

pub use noise::{AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, signal_power};
pub use signal::{generate_impulse, generate_log_sweep, generate_sine, generate_two_tone};
