use std::f32::consts::PI;

/// Sine of `freq_hz` with the given amplitude
pub fn generate_sine(
    num_samples: usize,
    sample_rate: f32,
    freq_hz: f32,
    amplitude: f32,
) -> Vec<f32> {
    let omega = 2.0 * PI * freq_hz / sample_rate;
    (0..num_samples)
        .map(|i| amplitude * (omega * i as f32).sin())
        .collect()
}

/// Sum of two equal-amplitude sines, each at `amplitude / 2`
pub fn generate_two_tone(
    num_samples: usize,
    sample_rate: f32,
    freq_a_hz: f32,
    freq_b_hz: f32,
    amplitude: f32,
) -> Vec<f32> {
    let a = generate_sine(num_samples, sample_rate, freq_a_hz, amplitude / 2.0);
    let b = generate_sine(num_samples, sample_rate, freq_b_hz, amplitude / 2.0);
    a.iter().zip(&b).map(|(x, y)| x + y).collect()
}

/// Logarithmic sine sweep from `start_hz` to `end_hz` over `duration_secs`
///
/// Instantaneous frequency grows exponentially, so every octave gets the
/// same time.
pub fn generate_log_sweep(
    duration_secs: f32,
    sample_rate: u32,
    start_hz: f32,
    end_hz: f32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let fs = sample_rate as f64;
    let (f0, f1) = (start_hz as f64, end_hz as f64);
    let duration = duration_secs as f64;

    if (f1 - f0).abs() < f64::EPSILON {
        return generate_sine(num_samples, sample_rate as f32, start_hz, amplitude);
    }

    let k = (f1 / f0).ln();
    let scale = 2.0 * std::f64::consts::PI * f0 * duration / k;

    (0..num_samples)
        .map(|i| {
            let t = i as f64 / fs;
            let phase = scale * ((t / duration * k).exp() - 1.0);
            amplitude * phase.sin() as f32
        })
        .collect()
}

/// Unit impulse of `amplitude` at `position`, zero elsewhere
pub fn generate_impulse(num_samples: usize, position: usize, amplitude: f32) -> Vec<f32> {
    let mut samples = vec![0.0; num_samples];
    if let Some(sample) = samples.get_mut(position) {
        *sample = amplitude;
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_peak() {
        let samples = generate_sine(4410, 44100.0, 100.0, 0.5);
        let peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_log_sweep_length_and_bounds() {
        let samples = generate_log_sweep(0.5, 8000, 100.0, 3000.0, 0.8);
        assert_eq!(samples.len(), 4000);
        assert!(samples.iter().all(|s| s.abs() <= 0.8 + 1e-6));
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn test_impulse_position() {
        let samples = generate_impulse(5, 2, 1.0);
        assert_eq!(samples, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(generate_impulse(2, 5, 1.0), vec![0.0, 0.0]);
    }
}
