/// Fixed-capacity block of mono samples
///
/// Only the first `len()` samples are valid. Ownership moves along the
/// pipeline: source, filter engine, then playback sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffer {
    samples: Vec<f32>,
    len: usize,
}

impl FrameBuffer {
    /// Create an empty frame that can hold up to `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            len: 0,
        }
    }

    /// Create a full frame from owned samples (capacity equals length)
    pub fn from_samples(samples: Vec<f32>) -> Self {
        let len = samples.len();
        Self { samples, len }
    }

    /// Create a frame of `capacity`, copying as much of `data` as fits
    pub fn from_slice(data: &[f32], capacity: usize) -> Self {
        let mut frame = Self::with_capacity(capacity);
        frame.fill_from(data);
        frame
    }

    /// Replace the frame's contents, truncating to capacity.
    /// Returns the number of samples copied.
    pub fn fill_from(&mut self, data: &[f32]) -> usize {
        let count = data.len().min(self.samples.len());
        self.samples[..count].copy_from_slice(&data[..count]);
        self.len = count;
        count
    }

    /// Append samples until the frame is full. Returns how many were taken.
    pub fn extend_from(&mut self, data: &[f32]) -> usize {
        let count = data.len().min(self.remaining());
        self.samples[self.len..self.len + count].copy_from_slice(&data[..count]);
        self.len += count;
        count
    }

    /// Append one sample; false if the frame is already full
    pub fn push(&mut self, sample: f32) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples[self.len] = sample;
        self.len += 1;
        true
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.samples[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.samples.len()
    }

    /// Samples that can still be appended
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.len
    }

    /// Mark the first `len` samples (clamped to capacity) as valid
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.samples.len());
    }

    pub fn into_samples(mut self) -> Vec<f32> {
        self.samples.truncate(self.len);
        self.samples
    }
}
