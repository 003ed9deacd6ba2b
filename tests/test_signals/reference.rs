/// Direct causal convolution of the whole signal, zero before the start
pub fn convolve(taps: &[f32], input: &[f32]) -> Vec<f32> {
    (0..input.len())
        .map(|t| {
            taps.iter()
                .enumerate()
                .filter(|(k, _)| *k <= t)
                .map(|(k, &tap)| tap as f64 * input[t - k] as f64)
                .sum::<f64>() as f32
        })
        .collect()
}

pub fn impulse(len: usize, position: usize) -> Vec<f32> {
    let mut samples = vec![0.0; len];
    samples[position] = 1.0;
    samples
}

/// Deterministic non-periodic test sequence in [-1, 1]
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| ((i * 37 % 101) as f32 / 50.0) - 1.0)
        .collect()
}
