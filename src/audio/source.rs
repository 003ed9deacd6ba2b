use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::{AudioCapture, FrameBuffer};
use crate::config::AudioConfig;
use crate::error::FilterError;
use crate::wav::read_wav_mono;

/// Producer of single-channel frames
///
/// `Ok(None)` means the source is exhausted. An `Err` is a gap: no frame was
/// available this time, but later calls may succeed.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> anyhow::Result<Option<FrameBuffer>>;
    fn sample_rate(&self) -> u32;
}

/// Frames captured from the default input device
pub struct DeviceSource {
    rx: Receiver<FrameBuffer>,
    sample_rate: u32,
    timeout: Duration,
    _capture: AudioCapture,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> anyhow::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(config.capture_queue_depth);
        let capture = AudioCapture::new(config, tx)?;

        // Two frame periods before a missing frame counts as a gap
        let frame_secs = config.frame_size as f64 / config.sample_rate as f64;
        Ok(Self {
            rx,
            sample_rate: config.sample_rate,
            timeout: Duration::from_secs_f64(frame_secs * 2.0),
            _capture: capture,
        })
    }
}

impl FrameSource for DeviceSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<FrameBuffer>> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Err(FilterError::ProducerStarved(format!(
                "no capture frame within {:?}",
                self.timeout
            ))
            .into()),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Frames read from the first channel of a WAV file
pub struct WavFileSource {
    samples: Vec<f32>,
    position: usize,
    frame_size: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, frame_size: usize) -> anyhow::Result<Self> {
        if frame_size == 0 {
            anyhow::bail!("Frame size must be positive");
        }
        let path = path.as_ref();
        let (samples, sample_rate) =
            read_wav_mono(path).with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(Self::from_samples(samples, sample_rate, frame_size))
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, frame_size: usize) -> Self {
        Self {
            samples,
            position: 0,
            frame_size: frame_size.max(1),
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FrameSource for WavFileSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<FrameBuffer>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.frame_size).min(self.samples.len());
        let frame = FrameBuffer::from_slice(&self.samples[self.position..end], self.frame_size);
        self.position = end;

        Ok(Some(frame))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
