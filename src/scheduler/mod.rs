//! Arbitration between the live and looped producers.
//!
//! A [`Scheduler`] owns the shared filter engine, the playback sink and the
//! optional reference signal. Live frames are pushed in by the capture side
//! through [`Scheduler::on_live_frame`]; looped passes are driven by a
//! dedicated worker thread. Exactly one producer is active at a time, and a
//! mode switch is visible to the other side at its next chunk boundary.

pub mod sink;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::{FrameBuffer, FrameSource, ReferenceSignal};
use crate::config::MeterConfig;
use crate::constants::IDLE_POLL_MS;
use crate::error::{FilterError, Result};
use crate::signal_processing::{
    CoefficientUpdater, FilterEngine, SharedEngine, level_db, normalize_level,
};

pub use sink::{ChannelSink, NullSink, PlaybackSink, ScheduledFrame};
pub use state::{ChunkCompletion, PassOutcome, ScheduleState, SourceMode};

/// Handle to the pipeline's scheduling context; clones share everything
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    engine: SharedEngine,
    sink: Mutex<Box<dyn PlaybackSink>>,
    reference: Option<ReferenceSignal>,
    state: Arc<ScheduleState>,
    frame_size: usize,
    floor_db: f32,
}

/// Counters from a [`Scheduler::run_live`] session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveSummary {
    /// Frames filtered and handed to the sink
    pub scheduled: u64,
    /// Frames discarded because looped mode was active
    pub ignored: u64,
    /// Times the source had no frame to give
    pub gaps: u64,
}

impl Scheduler {
    /// Create a scheduler in live mode
    ///
    /// Looped chunks are the engine's frame capacity long.
    pub fn new<S>(
        engine: SharedEngine,
        sink: S,
        reference: Option<ReferenceSignal>,
        meter: &MeterConfig,
    ) -> Self
    where
        S: PlaybackSink + 'static,
    {
        let frame_size = lock_engine(&engine).frame_capacity();
        Self {
            inner: Arc::new(Inner {
                engine,
                sink: Mutex::new(Box::new(sink)),
                reference,
                state: Arc::new(ScheduleState::new(SourceMode::Live, meter.floor_db)),
                frame_size,
                floor_db: meter.floor_db,
            }),
        }
    }

    /// Switch producers; a no-op if `mode` is already active
    ///
    /// Outstanding looped chunks are flushed from the sink and the chunk
    /// counter restarts from zero.
    pub fn set_mode(&self, mode: SourceMode) {
        if self.inner.state.mode() == mode {
            return;
        }
        let epoch = self.inner.state.switch_mode(mode);
        self.lock_sink().stop();
        log::info!("Switched to {:?} mode (epoch {})", mode, epoch);
    }

    /// Switch to the other producer and return the new mode
    pub fn toggle_mode(&self) -> SourceMode {
        let (mode, epoch) = self.inner.state.toggle_mode();
        self.lock_sink().stop();
        log::info!("Switched to {:?} mode (epoch {})", mode, epoch);
        mode
    }

    pub fn mode(&self) -> SourceMode {
        self.inner.state.mode()
    }

    pub fn remaining_chunks(&self) -> usize {
        self.inner.state.remaining_chunks()
    }

    /// Most recent power level in dB
    pub fn power_level(&self) -> f32 {
        self.inner.state.power_level()
    }

    /// Most recent power level mapped to `[0, 1]`
    pub fn normalized_level(&self) -> f32 {
        normalize_level(self.power_level(), self.inner.floor_db)
    }

    pub fn state(&self) -> &Arc<ScheduleState> {
        &self.inner.state
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.inner.engine
    }

    pub fn frame_size(&self) -> usize {
        self.inner.frame_size
    }

    pub fn coefficient_updater(&self) -> CoefficientUpdater {
        lock_engine(&self.inner.engine).coefficient_updater()
    }

    /// Filter one captured frame and schedule it for playback
    ///
    /// Returns `Ok(false)` without touching the engine when looped mode is
    /// active.
    pub fn on_live_frame(&self, frame: FrameBuffer) -> Result<bool> {
        let state = &self.inner.state;
        if state.mode() != SourceMode::Live {
            return Ok(false);
        }

        let level = level_db(frame.as_slice(), self.inner.floor_db);
        let output = lock_engine(&self.inner.engine).filter_frame(&frame)?;

        let mut sink = self.lock_sink();
        if state.mode() != SourceMode::Live {
            return Ok(false);
        }
        state.set_power_level(level);
        sink.schedule(output, None);
        Ok(true)
    }

    /// Feed frames from `source` until it is exhausted or shutdown is
    /// requested
    ///
    /// Source errors are treated as gaps: nothing is played for them and
    /// the next frame is requested.
    pub fn run_live<S: FrameSource + ?Sized>(&self, source: &mut S) -> LiveSummary {
        let mut summary = LiveSummary::default();

        while !self.inner.state.is_shutdown() {
            match source.next_frame() {
                Ok(Some(frame)) => match self.on_live_frame(frame) {
                    Ok(true) => summary.scheduled += 1,
                    Ok(false) => summary.ignored += 1,
                    Err(e) => log::warn!("Dropped live frame: {}", e),
                },
                Ok(None) => {
                    log::info!("Live source exhausted");
                    break;
                }
                Err(e) => {
                    summary.gaps += 1;
                    log::debug!("Live source gap: {:#}", e);
                }
            }
        }

        summary
    }

    /// Play the reference signal once through the engine
    ///
    /// Schedules every full chunk with a completion signal, then blocks
    /// until all of them have been played or the pass is cancelled by a
    /// mode switch or shutdown.
    ///
    /// # Errors
    /// Returns `FilterError::ProducerStarved` when there is no reference
    /// signal or it is shorter than one frame.
    pub fn run_loop_pass(&self) -> Result<PassOutcome> {
        let state = &self.inner.state;
        let frame_size = self.inner.frame_size;

        let epoch = state.epoch();
        if !state.is_current_pass(epoch) {
            return Ok(PassOutcome::Cancelled);
        }

        let reference = self
            .inner
            .reference
            .as_ref()
            .ok_or_else(|| FilterError::ProducerStarved("no reference signal loaded".into()))?;

        let chunks = reference.chunk_count(frame_size);
        if chunks == 0 {
            return Err(FilterError::ProducerStarved(format!(
                "reference of {} samples is shorter than one frame of {}",
                reference.len(),
                frame_size
            )));
        }

        if !state.begin_pass(epoch, chunks) {
            return Ok(PassOutcome::Cancelled);
        }
        log::debug!("Starting looped pass of {} chunks (epoch {})", chunks, epoch);

        for index in 0..chunks {
            let Some(chunk) = reference.chunk(index, frame_size) else {
                break;
            };

            let level = level_db(chunk.as_slice(), self.inner.floor_db);
            let output = lock_engine(&self.inner.engine).filter_frame(&chunk)?;

            let mut sink = self.lock_sink();
            if !state.is_current_pass(epoch) {
                log::debug!("Looped pass cancelled at chunk {}", index);
                return Ok(PassOutcome::Cancelled);
            }
            let completion = ChunkCompletion::new(state.clone(), epoch).with_level(level);
            sink.schedule(output, Some(completion));
        }

        Ok(state.wait_pass_complete(epoch))
    }

    /// Start the thread that runs looped passes whenever looped mode is
    /// active
    pub fn spawn_loop_worker(&self) -> std::io::Result<LoopWorker> {
        let scheduler = self.clone();
        let handle = thread::Builder::new()
            .name("firstream-loop".into())
            .spawn(move || scheduler.loop_worker())?;

        Ok(LoopWorker {
            scheduler: self.clone(),
            handle: Some(handle),
        })
    }

    /// Stop both producers and discard anything queued for playback
    pub fn shutdown(&self) {
        self.inner.state.request_shutdown();
        self.lock_sink().stop();
    }

    fn loop_worker(&self) {
        let retry = Duration::from_millis(IDLE_POLL_MS);
        let mut starved_epoch = None;

        while let Some(epoch) = self.inner.state.wait_for_looped() {
            match self.run_loop_pass() {
                Ok(PassOutcome::Completed) => log::debug!("Looped pass complete"),
                Ok(PassOutcome::Cancelled) => log::debug!("Looped pass cancelled"),
                Err(e) => {
                    if starved_epoch != Some(epoch) {
                        log::warn!("Looped mode has nothing to play: {}", e);
                        starved_epoch = Some(epoch);
                    }
                    self.inner.state.idle(epoch, retry);
                }
            }
        }

        log::debug!("Loop worker exiting");
    }

    fn lock_sink(&self) -> MutexGuard<'_, Box<dyn PlaybackSink>> {
        match self.inner.sink.lock() {
            Ok(guard) => guard,
            Err(err) => {
                log::error!("Playback sink lock poisoned: {}", err);
                err.into_inner()
            }
        }
    }
}

fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, FilterEngine> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(err) => {
            log::error!("Filter engine lock poisoned: {}", err);
            err.into_inner()
        }
    }
}

/// Running loop worker thread; shuts the scheduler down when dropped
pub struct LoopWorker {
    scheduler: Scheduler,
    handle: Option<JoinHandle<()>>,
}

impl LoopWorker {
    /// Request shutdown and wait for the thread to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scheduler.shutdown();
            if handle.join().is_err() {
                log::error!("Loop worker panicked");
            }
        }
    }
}

impl Drop for LoopWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
