use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

use firstream::audio::FrameBuffer;
use firstream::scheduler::{ChunkCompletion, PlaybackSink};

/// Everything a [`RecordingSink`] has been asked to do
#[derive(Debug, Default)]
pub struct Recorded {
    /// Scheduled frames with the epoch of their completion, if any
    pub frames: Vec<(Vec<f32>, Option<u64>)>,
    /// Completions of chunks still "playing"
    pub pending: Vec<ChunkCompletion>,
    /// Completions of chunks discarded by `stop`
    pub flushed: Vec<ChunkCompletion>,
    pub stops: usize,
}

/// Sink that plays nothing and leaves completion to the test
#[derive(Clone)]
pub struct RecordingSink {
    recorded: Arc<Mutex<Recorded>>,
    scheduled_tx: Sender<Option<u64>>,
}

impl RecordingSink {
    /// The receiver yields the completion epoch of each scheduled frame
    pub fn new() -> (Self, Receiver<Option<u64>>) {
        let (scheduled_tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                recorded: Arc::new(Mutex::new(Recorded::default())),
                scheduled_tx,
            },
            rx,
        )
    }

    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }

    /// Report every pending chunk as played; returns how many counted
    pub fn complete_all(&self) -> usize {
        let pending: Vec<_> = self.recorded().pending.drain(..).collect();
        pending
            .into_iter()
            .map(|completion| completion.complete())
            .filter(|&counted| counted)
            .count()
    }

    pub fn looped_frames(&self) -> usize {
        self.recorded()
            .frames
            .iter()
            .filter(|(_, epoch)| epoch.is_some())
            .count()
    }
}

impl PlaybackSink for RecordingSink {
    fn schedule(&mut self, frame: FrameBuffer, completion: Option<ChunkCompletion>) {
        let epoch = completion.as_ref().map(|c| c.epoch());
        {
            let mut recorded = self.recorded();
            recorded.frames.push((frame.into_samples(), epoch));
            if let Some(completion) = completion {
                recorded.pending.push(completion);
            }
        }
        let _ = self.scheduled_tx.send(epoch);
    }

    fn stop(&mut self) {
        let mut recorded = self.recorded();
        let pending: Vec<_> = recorded.pending.drain(..).collect();
        recorded.flushed.extend(pending);
        recorded.stops += 1;
    }
}
