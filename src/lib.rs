pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod scheduler;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::PipelineConfig;
pub use error::{FilterError, Result};
pub use wav::save_wav;
