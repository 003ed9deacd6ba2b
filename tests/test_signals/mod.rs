#![allow(dead_code, unused_imports)]

pub mod reference;
pub mod sinks;

pub use reference::{convolve, impulse, ramp};
pub use sinks::{Recorded, RecordingSink};
