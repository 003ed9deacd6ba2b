//! Numeric constants shared by the filter and metering paths.

/// Reference sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Reference frame size in samples (100 ms at the reference rate).
pub const DEFAULT_FRAME_SIZE: usize = 4_410;

/// Reference FIR length.
pub const DEFAULT_NUM_TAPS: usize = 256;

/// Reference cut-off bandwidth in Hz.
pub const DEFAULT_BANDWIDTH_HZ: f32 = 200.0;

/// Power level reported for silence, and the lowest level ever reported.
pub const SILENCE_FLOOR_DB: f32 = -60.0;

/// Upper bound on how long the loop worker sleeps before re-checking
/// a starved reference signal or a pending shutdown.
pub const IDLE_POLL_MS: u64 = 100;
