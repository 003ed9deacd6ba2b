use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::audio::FrameBuffer;
use crate::error::{FilterError, Result};
use crate::signal_processing::design::{CoefficientSet, FilterSpec, design};

/// Queued coefficient sets beyond this are refused rather than buffered.
const UPDATE_QUEUE_DEPTH: usize = 8;

/// Filter engine shared between the live callback and the loop worker
pub type SharedEngine = Arc<Mutex<FilterEngine>>;

/// Streaming block FIR filter with hot-swappable coefficients
///
/// Keeps the last `n - 1` input samples between frames so the convolution
/// is continuous across frame edges. New coefficient sets arrive over a
/// channel as owned values and are installed only at a frame boundary, so
/// a frame is always filtered with one complete set.
///
/// When a swap changes the tap count, the history is resized: the most
/// recent samples are kept and any extra (oldest) positions are zeroed.
pub struct FilterEngine {
    active: CoefficientSet,
    history: Vec<f32>,
    work: Vec<f32>,
    output: FrameBuffer,
    frame_capacity: usize,
    updates_tx: Sender<CoefficientSet>,
    updates_rx: Receiver<CoefficientSet>,
    generation: u64,
}

impl FilterEngine {
    /// Create an engine for frames of up to `frame_capacity` samples
    ///
    /// # Errors
    /// Returns `FilterError::InvalidSpec` if `frame_capacity` is zero
    pub fn new(frame_capacity: usize, initial: CoefficientSet) -> Result<Self> {
        if frame_capacity == 0 {
            return Err(FilterError::InvalidSpec(
                "frame capacity must be at least 1".into(),
            ));
        }

        let (updates_tx, updates_rx) = crossbeam_channel::bounded(UPDATE_QUEUE_DEPTH);

        log::info!(
            "Created FIR engine with frame capacity {} and {} taps",
            frame_capacity,
            initial.len()
        );

        Ok(Self {
            history: vec![0.0; initial.len() - 1],
            work: Vec::with_capacity(frame_capacity + initial.len() - 1),
            output: FrameBuffer::with_capacity(frame_capacity),
            active: initial,
            frame_capacity,
            updates_tx,
            updates_rx,
            generation: 0,
        })
    }

    /// Wrap the engine for sharing across threads
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Handle for installing coefficients from another thread
    pub fn coefficient_updater(&self) -> CoefficientUpdater {
        CoefficientUpdater {
            tx: self.updates_tx.clone(),
        }
    }

    /// Replace the active coefficients from the owning context
    ///
    /// Any sets still queued by a [`CoefficientUpdater`] are superseded.
    /// The tap-count change policy is to reconcile the history, so this
    /// never fails with `SizeMismatch`.
    pub fn update_coefficients(&mut self, set: CoefficientSet) -> Result<()> {
        for _ in self.updates_rx.try_iter() {}
        self.install(set);
        Ok(())
    }

    /// Filter one frame, storing the result for [`take_output`](Self::take_output)
    ///
    /// # Errors
    /// Returns `FilterError::FrameTooLarge` if the frame holds more samples
    /// than the engine's frame capacity; state is left untouched.
    pub fn process_frame(&mut self, input: &FrameBuffer) -> Result<()> {
        let len = input.len();
        if len > self.frame_capacity {
            return Err(FilterError::FrameTooLarge {
                len,
                capacity: self.frame_capacity,
            });
        }

        self.apply_pending_update();

        if self.output.capacity() != self.frame_capacity {
            self.output = FrameBuffer::with_capacity(self.frame_capacity);
        }
        self.output.set_len(len);
        if len == 0 {
            return Ok(());
        }

        let history_len = self.history.len();
        self.work.clear();
        self.work.extend_from_slice(&self.history);
        self.work.extend_from_slice(input.as_slice());

        let taps = self.active.taps();
        let work = &self.work;
        for (t, out) in self.output.as_mut_slice().iter_mut().enumerate() {
            let newest = history_len + t;
            let mut acc = 0.0f64;
            for (k, &tap) in taps.iter().enumerate() {
                acc += tap as f64 * work[newest - k] as f64;
            }
            *out = acc as f32;
        }

        let tail = self.work.len() - history_len;
        self.history.copy_from_slice(&self.work[tail..]);

        Ok(())
    }

    /// Hand over the most recently computed output
    ///
    /// The engine keeps no reference to the returned frame; calling this
    /// again before the next `process_frame` yields an empty frame.
    pub fn take_output(&mut self) -> FrameBuffer {
        std::mem::replace(
            &mut self.output,
            FrameBuffer::with_capacity(self.frame_capacity),
        )
    }

    /// Filter one frame and return its output
    pub fn filter_frame(&mut self, input: &FrameBuffer) -> Result<FrameBuffer> {
        self.process_frame(input)?;
        Ok(self.take_output())
    }

    /// Overwrite the convolution history
    ///
    /// # Errors
    /// Returns `FilterError::SizeMismatch` unless `history` holds exactly
    /// `num_taps() - 1` samples
    pub fn restore_history(&mut self, history: &[f32]) -> Result<()> {
        if history.len() != self.history.len() {
            return Err(FilterError::SizeMismatch {
                expected: self.history.len(),
                actual: history.len(),
            });
        }
        self.history.copy_from_slice(history);
        Ok(())
    }

    /// Zero the convolution history
    pub fn reset(&mut self) {
        self.history.fill(0.0);
    }

    pub fn taps(&self) -> &[f32] {
        self.active.taps()
    }

    pub fn num_taps(&self) -> usize {
        self.active.len()
    }

    pub fn history(&self) -> &[f32] {
        &self.history
    }

    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    /// Number of coefficient sets installed since construction
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn apply_pending_update(&mut self) {
        let mut latest = None;
        let mut superseded = 0usize;
        for set in self.updates_rx.try_iter() {
            if latest.replace(set).is_some() {
                superseded += 1;
            }
        }
        if superseded > 0 {
            log::debug!("Dropped {} superseded coefficient sets", superseded);
        }
        if let Some(set) = latest {
            self.install(set);
        }
    }

    fn install(&mut self, set: CoefficientSet) {
        let new_len = set.len() - 1;
        let old_len = self.history.len();

        if new_len < old_len {
            self.history.drain(..old_len - new_len);
        } else if new_len > old_len {
            let mut resized = vec![0.0; new_len - old_len];
            resized.extend_from_slice(&self.history);
            self.history = resized;
        }

        log::debug!(
            "Installed coefficient set with {} taps (was {})",
            set.len(),
            self.active.len()
        );
        self.active = set;
        self.generation += 1;
    }
}

/// Cloneable, `Send` handle that hands new coefficient sets to an engine
///
/// Never blocks: the set is queued and picked up at the engine's next
/// frame boundary.
#[derive(Clone)]
pub struct CoefficientUpdater {
    tx: Sender<CoefficientSet>,
}

impl CoefficientUpdater {
    /// Queue a coefficient set for installation
    ///
    /// # Errors
    /// Returns `FilterError::UpdateRejected` if the queue is full or the
    /// engine is gone; the previously active filter stays in place.
    pub fn install(&self, set: CoefficientSet) -> Result<()> {
        self.tx.try_send(set).map_err(|e| match e {
            TrySendError::Full(_) => FilterError::UpdateRejected("update queue full".into()),
            TrySendError::Disconnected(_) => {
                FilterError::UpdateRejected("filter engine dropped".into())
            }
        })
    }

    /// Design taps for `spec` and queue them
    pub fn redesign(&self, spec: &FilterSpec) -> Result<()> {
        self.install(design(spec))
    }
}
