pub mod capture;
pub mod frame;
pub mod playback;
pub mod reference;
pub mod source;

pub use capture::AudioCapture;
pub use frame::FrameBuffer;
pub use playback::{AudioPlayback, PlaybackHandle};
pub use reference::{ReferenceSignal, decimate};
pub use source::{DeviceSource, FrameSource, WavFileSource};
