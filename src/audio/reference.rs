use std::path::Path;

use anyhow::Context;

use super::FrameBuffer;
use crate::error::{FilterError, Result};
use crate::wav::read_wav_mono;

/// Fixed auxiliary signal played in looped mode
///
/// Loaded once at startup and brought to the pipeline's sample rate. The
/// scheduler only ever reads it in whole frame-size chunks.
#[derive(Debug, Clone)]
pub struct ReferenceSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl ReferenceSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Load the first channel of a WAV file and decimate it to `target_rate`
    pub fn from_wav<P: AsRef<Path>>(path: P, target_rate: u32) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let (samples, source_rate) = read_wav_mono(path)
            .with_context(|| format!("Failed to read reference WAV {}", path.display()))?;

        let samples = decimate(&samples, source_rate, target_rate)?;
        log::info!(
            "Loaded reference signal {} ({} Hz -> {} Hz, {} samples)",
            path.display(),
            source_rate,
            target_rate,
            samples.len()
        );

        Ok(Self::new(samples, target_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of full chunks of `frame_size`; a trailing partial chunk is
    /// never played
    pub fn chunk_count(&self, frame_size: usize) -> usize {
        if frame_size == 0 {
            return 0;
        }
        self.samples.len() / frame_size
    }

    /// Copy chunk `index` into a new frame
    pub fn chunk(&self, index: usize, frame_size: usize) -> Option<FrameBuffer> {
        if index >= self.chunk_count(frame_size) {
            return None;
        }
        let start = index * frame_size;
        Some(FrameBuffer::from_slice(
            &self.samples[start..start + frame_size],
            frame_size,
        ))
    }
}

/// Bring `samples` from `source_rate` down to `target_rate` by keeping every
/// `source_rate / target_rate`-th sample
///
/// Only integer ratios of at least one are supported; a ratio of one copies
/// the signal unchanged.
pub fn decimate(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return Err(FilterError::InvalidSpec(
            "sample rates must be positive".into(),
        ));
    }
    if source_rate < target_rate {
        return Err(FilterError::InvalidSpec(format!(
            "cannot upsample reference from {} Hz to {} Hz",
            source_rate, target_rate
        )));
    }
    if source_rate % target_rate != 0 {
        log::warn!(
            "Reference rate {} Hz is not a multiple of {} Hz; rounding the ratio down",
            source_rate,
            target_rate
        );
    }

    let ratio = (source_rate / target_rate) as usize;
    Ok(samples.iter().step_by(ratio).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_drops_partial_tail() {
        let reference = ReferenceSignal::new((0..10).map(|i| i as f32).collect(), 8000);
        assert_eq!(reference.chunk_count(4), 2);
        assert_eq!(reference.chunk(1, 4).unwrap().as_slice(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(reference.chunk(2, 4).is_none());
        assert_eq!(reference.chunk_count(0), 0);
    }

    #[test]
    fn test_short_reference_has_no_chunks() {
        let reference = ReferenceSignal::new(vec![0.1; 3], 8000);
        assert_eq!(reference.chunk_count(4), 0);
        assert!(reference.chunk(0, 4).is_none());
    }

    #[test]
    fn test_decimate_integer_ratio() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32).collect();
        assert_eq!(decimate(&samples, 96000, 48000).unwrap(), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(decimate(&samples, 44100, 44100).unwrap(), samples);
    }

    #[test]
    fn test_decimate_rejects_upsampling() {
        assert!(matches!(
            decimate(&[0.0; 4], 22050, 44100),
            Err(FilterError::InvalidSpec(_))
        ));
    }
}
