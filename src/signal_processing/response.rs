use num_complex::Complex;
use std::f32::consts::PI;

/// Evaluate the frequency response of an FIR filter at a single frequency
///
/// Computes `H(f) = sum(taps[k] * e^(-j 2 pi f k / fs))`.
pub fn frequency_response(taps: &[f32], freq_hz: f32, sample_rate: f32) -> Complex<f32> {
    let omega = 2.0 * PI * freq_hz / sample_rate;
    taps.iter()
        .enumerate()
        .fold(Complex::new(0.0, 0.0), |acc, (k, &tap)| {
            acc + Complex::from_polar(tap, -omega * k as f32)
        })
}

/// Magnitude of the response at `freq_hz` in dB (floored at -200 dB)
pub fn magnitude_db(taps: &[f32], freq_hz: f32, sample_rate: f32) -> f32 {
    let magnitude = frequency_response(taps, freq_hz, sample_rate).norm();
    20.0 * magnitude.max(1e-10).log10()
}
