//! Configuration for the firstream pipeline.
//!
//! Defaults reproduce the reference setup: 44.1 kHz mono, 100 ms frames,
//! a 256-tap windowed-sinc filter with 200 Hz bandwidth. Any subset of the
//! fields can be overridden from a TOML file:
//!
//! ```toml
//! [filter]
//! num_taps = 127
//! initial_center = "0.25"
//!
//! [meter]
//! floor_db = -72.0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_BANDWIDTH_HZ, DEFAULT_FRAME_SIZE, DEFAULT_NUM_TAPS, DEFAULT_SAMPLE_RATE,
    SILENCE_FLOOR_DB,
};
use crate::error::{FilterError, Result};
use crate::scheduler::SourceMode;
use crate::signal_processing::{CoefficientSet, FilterSpec, design};

/// Filter center frequency as entered by the user
///
/// # Parsing formats
/// - `0.25` - normalized control value in `[0, 1]`, scaled to `[0, fs/2]`
/// - `5000hz` or `5000Hz` - absolute frequency in Hz
///
/// # Example
/// ```
/// use firstream::config::CenterFrequency;
///
/// let center: CenterFrequency = "0.5".parse().unwrap();
/// assert_eq!(center.to_hz(44100.0), 11025.0);
///
/// let center: CenterFrequency = "1200hz".parse().unwrap();
/// assert_eq!(center.to_hz(44100.0), 1200.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CenterFrequency {
    Normalized(f32),
    Hz(f32),
}

impl CenterFrequency {
    /// Resolve to Hz for the given sample rate
    pub fn to_hz(&self, sample_rate: f32) -> f32 {
        match *self {
            CenterFrequency::Normalized(control) => control * sample_rate / 2.0,
            CenterFrequency::Hz(hz) => hz,
        }
    }
}

impl fmt::Display for CenterFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CenterFrequency::Normalized(control) => write!(f, "{}", control),
            CenterFrequency::Hz(hz) => write!(f, "{}hz", hz),
        }
    }
}

impl FromStr for CenterFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
        {
            let hz: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid frequency: {}", s))?;
            if !hz.is_finite() || hz < 0.0 {
                return Err("frequency must not be negative".to_string());
            }
            return Ok(CenterFrequency::Hz(hz));
        }

        let control: f32 = s
            .parse()
            .map_err(|_| format!("invalid center value: {}", s))?;
        if !(0.0..=1.0).contains(&control) {
            return Err("normalized center must be within [0, 1]".to_string());
        }
        Ok(CenterFrequency::Normalized(control))
    }
}

impl<'de> Deserialize<'de> for CenterFrequency {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use firstream::config::PipelineConfig;
///
/// let mut config = PipelineConfig::default();
/// config.filter.num_taps = 127;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Audio device and framing configuration
    pub audio: AudioConfig,
    /// Filter design configuration
    pub filter: FilterConfig,
    /// Power meter configuration
    pub meter: MeterConfig,
}

/// Audio device and framing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz for capture, playback and filter design
    pub sample_rate: u32,
    /// Samples per frame handed to the filter engine
    pub frame_size: usize,
    /// Channels requested from the input device (only the first is used)
    pub input_channels: u16,
    /// Channels of the output device (the mono signal is copied to each)
    pub output_channels: u16,
    /// Captured frames buffered between the device callback and the scheduler
    pub capture_queue_depth: usize,
    /// Mode entered at startup
    pub initial_mode: SourceMode,
}

/// Filter design configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// FIR length
    pub num_taps: usize,
    /// Cut-off bandwidth in Hz
    pub bandwidth_hz: f32,
    /// Center to design at startup; without one the engine starts as a
    /// single-tap passthrough
    pub initial_center: Option<CenterFrequency>,
}

/// Power meter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Level reported for silence, and the lowest level reported
    pub floor_db: f32,
    /// Rate at which level reports are emitted
    pub report_rate_hz: f32,
}

impl PipelineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| FilterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FilterError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the values a pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(FilterError::Config("sample_rate must be positive".into()));
        }
        if self.audio.frame_size == 0 {
            return Err(FilterError::Config("frame_size must be positive".into()));
        }
        if self.audio.input_channels == 0 || self.audio.output_channels == 0 {
            return Err(FilterError::Config("channel counts must be positive".into()));
        }
        if self.filter.num_taps == 0 {
            return Err(FilterError::Config("num_taps must be positive".into()));
        }
        if !self.filter.bandwidth_hz.is_finite() || self.filter.bandwidth_hz <= 0.0 {
            return Err(FilterError::Config("bandwidth_hz must be positive".into()));
        }
        if self.audio.capture_queue_depth == 0 {
            return Err(FilterError::Config(
                "capture_queue_depth must be at least 1".into(),
            ));
        }
        let rate = self.meter.report_rate_hz;
        if !rate.is_finite() || rate <= 0.0 || !rate.recip().is_finite() {
            return Err(FilterError::Config(
                "report_rate_hz must be positive and finite".into(),
            ));
        }
        Ok(())
    }

    /// Coefficients to start the engine with
    pub fn initial_coefficients(&self) -> Result<CoefficientSet> {
        match self.filter.initial_center {
            Some(center) => {
                let spec = self.filter.spec_for(center, self.audio.sample_rate as f32)?;
                Ok(design(&spec))
            }
            None => Ok(CoefficientSet::passthrough()),
        }
    }
}

impl FilterConfig {
    /// Build the design specification for `center` at `sample_rate`
    pub fn spec_for(&self, center: CenterFrequency, sample_rate: f32) -> Result<FilterSpec> {
        FilterSpec::new(
            center.to_hz(sample_rate),
            self.bandwidth_hz,
            self.num_taps,
            sample_rate,
        )
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            input_channels: 1,
            output_channels: 2,
            capture_queue_depth: 10,
            initial_mode: SourceMode::Live,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            num_taps: DEFAULT_NUM_TAPS,
            bandwidth_hz: DEFAULT_BANDWIDTH_HZ,
            initial_center: None,
        }
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            floor_db: SILENCE_FLOOR_DB,
            report_rate_hz: 10.0,
        }
    }
}
