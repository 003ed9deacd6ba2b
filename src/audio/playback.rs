use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::FrameBuffer;
use crate::config::AudioConfig;
use crate::error::{FilterError, Result};
use crate::scheduler::{ChannelSink, ChunkCompletion, PlaybackSink, ScheduledFrame};

/// Output stream on the default playback device
///
/// Plays scheduled frames back to back, copying the mono signal to every
/// output channel, and outputs silence while nothing is queued. Once a
/// looped chunk's last sample has been written the callback hands its
/// completion to a dispatcher thread, so the callback never waits on the
/// scheduler's lock.
pub struct AudioPlayback {
    stream: Option<cpal::Stream>,
    dispatcher: Option<JoinHandle<()>>,
}

/// Completions the callback can hand off before falling back to completing
/// them inline
const COMPLETION_QUEUE: usize = 64;

/// Scheduling side of an [`AudioPlayback`] stream
pub struct PlaybackHandle {
    queue: ChannelSink,
    flushes: Arc<AtomicU64>,
}

struct Playing {
    frame: FrameBuffer,
    completion: Option<ChunkCompletion>,
    position: usize,
}

impl AudioPlayback {
    pub fn new(config: &AudioConfig) -> Result<(Self, PlaybackHandle)> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| FilterError::AudioDevice("No output device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.output_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let (completions, finished) = crossbeam_channel::bounded(COMPLETION_QUEUE);
        let dispatcher = thread::Builder::new()
            .name("firstream-completions".into())
            .spawn(move || dispatch_completions(finished))
            .map_err(|e| FilterError::AudioStream(format!("completion thread: {}", e)))?;

        let (queue, rx) = ChannelSink::new();
        let flushes = Arc::new(AtomicU64::new(0));
        let mut renderer = Renderer {
            rx,
            completions,
            flushes: flushes.clone(),
            seen_flushes: 0,
            playing: None,
            channels: config.output_channels.max(1) as usize,
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
                |err| log::error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        let playback = Self {
            stream: Some(stream),
            dispatcher: Some(dispatcher),
        };
        Ok((playback, PlaybackHandle { queue, flushes }))
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        // The callback owned the last completion sender
        if let Some(Err(_)) = self.dispatcher.take().map(JoinHandle::join) {
            log::error!("Completion dispatcher panicked");
        }
    }
}

fn dispatch_completions(finished: Receiver<ChunkCompletion>) {
    for completion in finished {
        completion.complete();
    }
    log::debug!("Completion dispatcher stopped");
}

impl PlaybackSink for PlaybackHandle {
    fn schedule(&mut self, frame: FrameBuffer, completion: Option<ChunkCompletion>) {
        self.queue.schedule(frame, completion);
    }

    fn stop(&mut self) {
        self.flushes.fetch_add(1, Ordering::AcqRel);
        self.queue.stop();
    }
}

struct Renderer {
    rx: Receiver<ScheduledFrame>,
    completions: Sender<ChunkCompletion>,
    flushes: Arc<AtomicU64>,
    seen_flushes: u64,
    playing: Option<Playing>,
    channels: usize,
}

impl Renderer {
    fn render(&mut self, data: &mut [f32]) {
        let flushes = self.flushes.load(Ordering::Acquire);
        if flushes != self.seen_flushes {
            self.seen_flushes = flushes;
            self.playing = None;
        }

        for out in data.chunks_mut(self.channels) {
            let sample = self.next_sample();
            out.fill(sample);
        }
    }

    fn next_sample(&mut self) -> f32 {
        if self.playing.is_none() {
            self.playing = self.rx.try_recv().ok().map(|scheduled| Playing {
                frame: scheduled.frame,
                completion: scheduled.completion,
                position: 0,
            });
        }

        let Some(playing) = self.playing.as_mut() else {
            return 0.0;
        };

        let samples = playing.frame.as_slice();
        let sample = samples.get(playing.position).copied().unwrap_or(0.0);
        playing.position += 1;

        if playing.position >= samples.len() {
            let done = self.playing.take();
            if let Some(completion) = done.and_then(|done| done.completion) {
                self.dispatch(completion);
            }
        }

        sample
    }

    fn dispatch(&self, completion: ChunkCompletion) {
        if let Err(e) = self.completions.try_send(completion) {
            e.into_inner().complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SILENCE_FLOOR_DB;
    use crate::scheduler::{ScheduleState, SourceMode};

    fn renderer(channels: usize) -> (Renderer, PlaybackHandle, Receiver<ChunkCompletion>) {
        let (queue, rx) = ChannelSink::new();
        let (completions, finished) = crossbeam_channel::bounded(COMPLETION_QUEUE);
        let flushes = Arc::new(AtomicU64::new(0));
        (
            Renderer {
                rx,
                completions,
                flushes: flushes.clone(),
                seen_flushes: 0,
                playing: None,
                channels,
            },
            PlaybackHandle { queue, flushes },
            finished,
        )
    }

    #[test]
    fn test_render_copies_to_all_channels_then_silence() {
        let (mut renderer, mut handle, _finished) = renderer(2);
        handle.schedule(FrameBuffer::from_samples(vec![0.5, -0.5]), None);

        let mut out = [9.0f32; 6];
        renderer.render(&mut out);
        assert_eq!(out, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_completion_handed_off_after_last_sample() {
        let state = Arc::new(ScheduleState::new(SourceMode::Looped, SILENCE_FLOOR_DB));
        let epoch = state.epoch();
        assert!(state.begin_pass(epoch, 1));

        let (mut renderer, mut handle, finished) = renderer(1);
        let completion = ChunkCompletion::new(state.clone(), epoch);
        handle.schedule(FrameBuffer::from_samples(vec![0.1; 4]), Some(completion));

        let mut out = [0.0f32; 3];
        renderer.render(&mut out);
        assert!(finished.is_empty());

        // The callback only queues it; the state changes on the dispatcher
        renderer.render(&mut out);
        assert_eq!(state.remaining_chunks(), 1);

        assert_eq!(finished.len(), 1);

        // Dropping the renderer closes the queue, so the dispatcher returns
        drop(renderer);
        dispatch_completions(finished);
        assert_eq!(state.remaining_chunks(), 0);
    }

    #[test]
    fn test_completion_inline_without_dispatcher() {
        let state = Arc::new(ScheduleState::new(SourceMode::Looped, SILENCE_FLOOR_DB));
        let epoch = state.epoch();
        assert!(state.begin_pass(epoch, 1));

        let (mut renderer, mut handle, finished) = renderer(1);
        drop(finished);
        handle.schedule(
            FrameBuffer::from_samples(vec![0.1; 2]),
            Some(ChunkCompletion::new(state.clone(), epoch)),
        );

        let mut out = [0.0f32; 2];
        renderer.render(&mut out);
        assert_eq!(state.remaining_chunks(), 0);
    }

    #[test]
    fn test_stop_drops_frame_in_progress() {
        let (mut renderer, mut handle, _finished) = renderer(1);
        handle.schedule(FrameBuffer::from_samples(vec![1.0; 4]), None);
        handle.schedule(FrameBuffer::from_samples(vec![2.0; 4]), None);

        let mut out = [0.0f32; 2];
        renderer.render(&mut out);
        assert_eq!(out, [1.0, 1.0]);

        handle.stop();
        renderer.render(&mut out);
        assert_eq!(out, [0.0, 0.0]);
    }
}
