use std::sync::atomic::{AtomicU32, Ordering};

use crate::constants::SILENCE_FLOOR_DB;

/// Mean absolute sample value, 0 for an empty slice
pub fn mean_magnitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// Power level of a block in dB: `20 * log10(mean |x|)`
///
/// Silence (mean magnitude of 0) and anything quieter than `floor_db`
/// report `floor_db`.
pub fn level_db(samples: &[f32], floor_db: f32) -> f32 {
    let mean = mean_magnitude(samples);
    if mean <= 0.0 {
        return floor_db;
    }
    (20.0 * mean.log10()).max(floor_db)
}

/// Map a dB level onto `[0, 1]` for display
///
/// Levels below `floor_db`, and exactly 0 dB (the uninitialised level),
/// map to 0. Everything else follows a square-root amplitude curve that
/// reaches 1 at full scale.
pub fn normalize_level(db: f32, floor_db: f32) -> f32 {
    if db < floor_db || db == 0.0 {
        return 0.0;
    }
    let floor_amp = 10.0f32.powf(0.05 * floor_db);
    let amp = 10.0f32.powf(0.05 * db);
    ((amp - floor_amp) / (1.0 - floor_amp)).max(0.0).sqrt()
}

/// Lock-free cell holding the most recent power level
///
/// Written by whichever producer is active, read by the visualisation side
/// on its own schedule.
#[derive(Debug)]
pub struct PowerLevel {
    bits: AtomicU32,
}

impl PowerLevel {
    pub fn new(initial_db: f32) -> Self {
        Self {
            bits: AtomicU32::new(initial_db.to_bits()),
        }
    }

    pub fn set(&self, db: f32) {
        self.bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for PowerLevel {
    fn default() -> Self {
        Self::new(SILENCE_FLOOR_DB)
    }
}
