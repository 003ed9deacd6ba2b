use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid filter specification: {0}")]
    InvalidSpec(String),

    #[error("Coefficient size mismatch: expected {expected} taps, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("No frame available from source: {0}")]
    ProducerStarved(String),

    #[error("Filter engine has no coefficients installed")]
    EngineNotReady,

    #[error("Coefficient update rejected: {0}")]
    UpdateRejected(String),

    #[error("Frame of {len} samples exceeds engine capacity of {capacity}")]
    FrameTooLarge { len: usize, capacity: usize },

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WAV I/O error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
