use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Sender, TrySendError};

use super::FrameBuffer;
use crate::config::AudioConfig;
use crate::error::{FilterError, Result};

/// Input stream on the default capture device
///
/// Keeps the first channel of each callback and delivers it in frames of
/// exactly `frame_size` samples. The callback never blocks: when the
/// consumer falls behind, whole frames are dropped.
pub struct AudioCapture {
    stream: cpal::Stream,
    _rt_handle: Option<RtPriorityHandle>,
}

impl AudioCapture {
    pub fn new(config: &AudioConfig, tx: Sender<FrameBuffer>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| FilterError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.input_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let channels = config.input_channels.max(1) as usize;
        let frame_size = config.frame_size;
        let mut pending = FrameBuffer::with_capacity(frame_size);
        let mut dropped: u64 = 0;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data.iter().step_by(channels) {
                        pending.push(sample);
                        if !pending.is_full() {
                            continue;
                        }

                        let frame =
                            std::mem::replace(&mut pending, FrameBuffer::with_capacity(frame_size));
                        match tx.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                dropped += 1;
                                if dropped.is_power_of_two() {
                                    log::warn!("Capture queue full, {} frames dropped", dropped);
                                }
                            }
                            Err(TrySendError::Disconnected(_)) => {
                                log::warn!("Audio receiver dropped");
                            }
                        }
                    }
                },
                |err| log::error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        let rt_handle = audio_thread_priority::promote_current_thread_to_real_time(
            config.frame_size as u32,
            config.sample_rate,
        );

        let rt_handle = match rt_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        };

        stream
            .play()
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            stream,
            _rt_handle: rt_handle,
        })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
