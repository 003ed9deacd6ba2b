pub mod design;
pub mod fir_engine;
pub mod meter;
pub mod response;

pub use design::{CoefficientSet, FilterKind, FilterSpec, design};
pub use fir_engine::{CoefficientUpdater, FilterEngine, SharedEngine};
pub use meter::{PowerLevel, level_db, mean_magnitude, normalize_level};
pub use response::{frequency_response, magnitude_db};
