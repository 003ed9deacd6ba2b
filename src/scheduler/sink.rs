use crossbeam_channel::{Receiver, Sender};

use super::state::ChunkCompletion;
use crate::audio::FrameBuffer;

/// Filtered frame queued for playback, with its optional completion signal
#[derive(Debug)]
pub struct ScheduledFrame {
    pub frame: FrameBuffer,
    pub completion: Option<ChunkCompletion>,
}

/// Destination for filtered frames
///
/// Implementations must call [`ChunkCompletion::complete`] once a chunk's
/// last sample has been played, and must drop queued chunks without
/// completing them on [`stop`](PlaybackSink::stop).
pub trait PlaybackSink: Send {
    fn schedule(&mut self, frame: FrameBuffer, completion: Option<ChunkCompletion>);

    /// Stop playback and discard everything queued
    fn stop(&mut self);
}

/// Sink that discards frames and reports them played immediately
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn schedule(&mut self, _frame: FrameBuffer, completion: Option<ChunkCompletion>) {
        if let Some(completion) = completion {
            completion.complete();
        }
    }

    fn stop(&mut self) {}
}

/// Sink that forwards frames over a channel to whoever plays them
///
/// `stop` drains the queue from the sending side, so a consumer that is
/// slow to run (an audio callback) never sees stale frames.
pub struct ChannelSink {
    tx: Sender<ScheduledFrame>,
    drain: Receiver<ScheduledFrame>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the playback side
    pub fn new() -> (Self, Receiver<ScheduledFrame>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                tx,
                drain: rx.clone(),
            },
            rx,
        )
    }

    /// Frames queued but not yet taken by the consumer
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

impl PlaybackSink for ChannelSink {
    fn schedule(&mut self, frame: FrameBuffer, completion: Option<ChunkCompletion>) {
        if self.tx.send(ScheduledFrame { frame, completion }).is_err() {
            log::warn!("Playback receiver dropped");
        }
    }

    fn stop(&mut self) {
        let flushed = self.drain.try_iter().count();
        if flushed > 0 {
            log::debug!("Flushed {} queued frames", flushed);
        }
    }
}
