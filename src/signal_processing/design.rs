use std::f32::consts::PI;

use crate::error::{FilterError, Result};

/// Classification of a [`FilterSpec`] by where its center frequency sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

/// Validated windowed-sinc filter specification
///
/// * `center_hz` - Center frequency. 0 gives a low-pass, `fs/2` a high-pass,
///   anything in between a band-pass around it.
/// * `bandwidth_hz` - Cut-off bandwidth (half of the -3 dB passband)
/// * `num_taps` - FIR length, odd gives a well-defined center tap
/// * `sample_rate` - Sample rate the taps are designed for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    center_hz: f32,
    bandwidth_hz: f32,
    num_taps: usize,
    sample_rate: f32,
}

impl FilterSpec {
    /// Create a specification, rejecting anything outside
    /// `0 <= fc <= fs/2`, `bw > 0`, `n >= 1`, `fs > 0`.
    pub fn new(
        center_hz: f32,
        bandwidth_hz: f32,
        num_taps: usize,
        sample_rate: f32,
    ) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(FilterError::InvalidSpec(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if !bandwidth_hz.is_finite() || bandwidth_hz <= 0.0 {
            return Err(FilterError::InvalidSpec(format!(
                "bandwidth must be positive, got {}",
                bandwidth_hz
            )));
        }
        if num_taps == 0 {
            return Err(FilterError::InvalidSpec("tap count must be at least 1".into()));
        }
        let nyquist = sample_rate / 2.0;
        if !center_hz.is_finite() || !(0.0..=nyquist).contains(&center_hz) {
            return Err(FilterError::InvalidSpec(format!(
                "center frequency {} outside [0, {}]",
                center_hz, nyquist
            )));
        }

        Ok(Self {
            center_hz,
            bandwidth_hz,
            num_taps,
            sample_rate,
        })
    }

    /// Create a specification from a normalized `[0, 1]` control value
    /// scaled onto `[0, fs/2]`.
    pub fn from_normalized(
        control: f32,
        bandwidth_hz: f32,
        num_taps: usize,
        sample_rate: f32,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&control) {
            return Err(FilterError::InvalidSpec(format!(
                "normalized center {} outside [0, 1]",
                control
            )));
        }
        Self::new(control * sample_rate / 2.0, bandwidth_hz, num_taps, sample_rate)
    }

    pub fn center_hz(&self) -> f32 {
        self.center_hz
    }

    pub fn bandwidth_hz(&self) -> f32 {
        self.bandwidth_hz
    }

    pub fn num_taps(&self) -> usize {
        self.num_taps
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn kind(&self) -> FilterKind {
        if self.center_hz == 0.0 {
            FilterKind::LowPass
        } else if self.center_hz == self.sample_rate / 2.0 {
            FilterKind::HighPass
        } else {
            FilterKind::BandPass
        }
    }
}

/// Immutable, non-empty set of FIR taps (index 0 is the earliest in time)
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet {
    taps: Vec<f32>,
}

impl CoefficientSet {
    /// Wrap a tap vector, rejecting an empty one.
    pub fn new(taps: Vec<f32>) -> Result<Self> {
        if taps.is_empty() {
            return Err(FilterError::InvalidSpec(
                "coefficient set must contain at least one tap".into(),
            ));
        }
        Ok(Self { taps })
    }

    /// Single unit tap: output equals input.
    pub fn passthrough() -> Self {
        Self { taps: vec![1.0] }
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Sum of all taps, i.e. the gain at 0 Hz
    pub fn dc_gain(&self) -> f32 {
        self.taps.iter().sum()
    }
}

/// Design FIR taps with the windowed-sinc method
///
/// A Hamming-windowed sinc low-pass kernel of width `bw / fs` is shifted up
/// to `fc` by cosine modulation. The `4 * delta_f` gain compensates the
/// window's passband loss so the passband sits near unity.
pub fn design(spec: &FilterSpec) -> CoefficientSet {
    let n = spec.num_taps;
    let fs = spec.sample_rate;
    let fc = spec.center_hz;

    match spec.kind() {
        FilterKind::LowPass => {
            log::debug!("Designing low-pass, cut-off {} Hz, {} taps", spec.bandwidth_hz, n)
        }
        FilterKind::HighPass => log::debug!(
            "Designing high-pass, cut-off {} Hz, {} taps",
            fc - spec.bandwidth_hz,
            n
        ),
        FilterKind::BandPass => log::debug!(
            "Designing band-pass, center {} Hz, bandwidth {} Hz, {} taps",
            fc,
            spec.bandwidth_hz,
            n
        ),
    }

    let delta_f = spec.bandwidth_hz / fs;
    let center = (n / 2) as isize;
    let gain = 4.0 * delta_f;

    let taps = (0..n)
        .map(|i| {
            let shift = i as isize - center;
            let a = 2.0 * PI * delta_f * shift as f32;
            let sinc = if a == 0.0 { 1.0 } else { a.sin() / a };
            let window = 0.54 - 0.46 * ((2.0 * PI / n as f32) * i as f32).cos();
            let modulation = (shift as f32 * 2.0 * PI * fc / fs).cos();
            modulation * window * gain * sinc
        })
        .collect();

    CoefficientSet { taps }
}
