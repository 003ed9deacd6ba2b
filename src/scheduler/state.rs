use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::signal_processing::PowerLevel;

/// Which producer currently feeds the filter engine
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Live capture frames from the input device
    Live,
    /// Repeated passes over the reference signal
    Looped,
}

impl SourceMode {
    pub fn toggled(self) -> Self {
        match self {
            SourceMode::Live => SourceMode::Looped,
            SourceMode::Looped => SourceMode::Live,
        }
    }
}

/// How a looped pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every chunk was scheduled and reported played
    Completed,
    /// The mode changed or shutdown was requested before the pass finished
    Cancelled,
}

#[derive(Debug)]
struct Progress {
    mode: SourceMode,
    remaining_chunks: usize,
    epoch: u64,
    shutdown: bool,
}

/// Process-wide scheduling state
///
/// Every mode switch starts a new epoch. Chunk completions carry the epoch
/// they were issued in, so completions that arrive after a switch cannot
/// disturb the counter of the next pass. Waiters block on a condition
/// variable that is signalled on every change.
#[derive(Debug)]
pub struct ScheduleState {
    progress: Mutex<Progress>,
    changed: Condvar,
    power: PowerLevel,
}

impl ScheduleState {
    pub fn new(mode: SourceMode, floor_db: f32) -> Self {
        Self {
            progress: Mutex::new(Progress {
                mode,
                remaining_chunks: 0,
                epoch: 0,
                shutdown: false,
            }),
            changed: Condvar::new(),
            power: PowerLevel::new(floor_db),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        match self.progress.lock() {
            Ok(guard) => guard,
            Err(err) => {
                log::error!("Schedule state lock poisoned: {}", err);
                err.into_inner()
            }
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.lock().mode
    }

    pub fn remaining_chunks(&self) -> usize {
        self.lock().remaining_chunks
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Most recent power level in dB
    pub fn power_level(&self) -> f32 {
        self.power.get()
    }

    pub(crate) fn set_power_level(&self, db: f32) {
        self.power.set(db);
    }

    /// Enter `mode`, clearing the chunk counter and starting a new epoch
    pub(crate) fn switch_mode(&self, mode: SourceMode) -> u64 {
        let mut progress = self.lock();
        progress.mode = mode;
        progress.remaining_chunks = 0;
        progress.epoch += 1;
        let epoch = progress.epoch;
        drop(progress);
        self.changed.notify_all();
        epoch
    }

    /// Enter the other mode; returns the new mode and its epoch
    pub(crate) fn toggle_mode(&self) -> (SourceMode, u64) {
        let mut progress = self.lock();
        progress.mode = progress.mode.toggled();
        progress.remaining_chunks = 0;
        progress.epoch += 1;
        let switched = (progress.mode, progress.epoch);
        drop(progress);
        self.changed.notify_all();
        switched
    }

    pub(crate) fn request_shutdown(&self) {
        self.lock().shutdown = true;
        self.changed.notify_all();
    }

    /// True while `epoch` is a looped epoch that has not been superseded
    pub(crate) fn is_current_pass(&self, epoch: u64) -> bool {
        let progress = self.lock();
        progress.mode == SourceMode::Looped && progress.epoch == epoch && !progress.shutdown
    }

    /// Start counting `chunks` outstanding chunks for a pass in `epoch`
    pub(crate) fn begin_pass(&self, epoch: u64, chunks: usize) -> bool {
        let mut progress = self.lock();
        if progress.mode != SourceMode::Looped || progress.epoch != epoch || progress.shutdown {
            return false;
        }
        progress.remaining_chunks = chunks;
        true
    }

    /// Block until the pass in `epoch` has no outstanding chunks
    pub(crate) fn wait_pass_complete(&self, epoch: u64) -> PassOutcome {
        let guard = self.lock();
        let guard = match self.changed.wait_while(guard, |p| {
            p.epoch == epoch && !p.shutdown && p.remaining_chunks > 0
        }) {
            Ok(guard) => guard,
            Err(err) => err.into_inner(),
        };
        if guard.epoch == epoch && !guard.shutdown {
            PassOutcome::Completed
        } else {
            PassOutcome::Cancelled
        }
    }

    /// Block until looped mode is active; `None` once shutdown is requested
    pub(crate) fn wait_for_looped(&self) -> Option<u64> {
        let guard = self.lock();
        let guard = match self
            .changed
            .wait_while(guard, |p| p.mode != SourceMode::Looped && !p.shutdown)
        {
            Ok(guard) => guard,
            Err(err) => err.into_inner(),
        };
        if guard.shutdown {
            None
        } else {
            Some(guard.epoch)
        }
    }

    /// Sleep up to `timeout`, waking early if the epoch changes or
    /// shutdown is requested
    pub(crate) fn idle(&self, epoch: u64, timeout: Duration) {
        let guard = self.lock();
        let _ = self
            .changed
            .wait_timeout_while(guard, timeout, |p| p.epoch == epoch && !p.shutdown);
    }

    fn complete_chunk(&self, epoch: u64, level_db: Option<f32>) -> bool {
        let mut progress = self.lock();
        if progress.epoch != epoch || progress.remaining_chunks == 0 {
            return false;
        }
        progress.remaining_chunks -= 1;
        if let Some(db) = level_db {
            self.power.set(db);
        }
        drop(progress);
        self.changed.notify_all();
        true
    }
}

/// Playback-completion signal for one scheduled looped chunk
///
/// Dropping it without calling [`complete`](Self::complete) leaves the
/// counter untouched, which is what a flushed chunk should do.
#[derive(Debug)]
pub struct ChunkCompletion {
    state: Arc<ScheduleState>,
    epoch: u64,
    level_db: Option<f32>,
}

impl ChunkCompletion {
    pub(crate) fn new(state: Arc<ScheduleState>, epoch: u64) -> Self {
        Self {
            state,
            epoch,
            level_db: None,
        }
    }

    /// Publish `db` as the power level when the chunk is played
    pub(crate) fn with_level(mut self, db: f32) -> Self {
        self.level_db = Some(db);
        self
    }

    /// Report the chunk as played. Returns false if it belonged to an
    /// epoch that has since ended.
    pub fn complete(self) -> bool {
        self.state.complete_chunk(self.epoch, self.level_db)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
