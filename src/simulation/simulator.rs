//! Week-by-week abundance evolution under dietary pressure.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::simulation::{AbundanceVector, SessionError, combined_delta};

/// Days between two emitted samples.
pub const DAYS_PER_STEP: u32 = 7;
/// Converts a weekly delta into percentage points.
pub const PERCENT_SCALE: f64 = 0.01;
pub const NOISE_LOW: f64 = 0.995;
pub const NOISE_HIGH: f64 = 1.005;
/// Longest single phase the simulator accepts, about a century.
pub const MAX_PHASE_DAYS: u32 = 36_500;

/// Supplier of uniform draws for the multiplicative step noise.
pub trait NoiseSource {
    /// Returns a value in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Production noise: an entropy-seeded small RNG, never reproducible.
#[derive(Debug, Clone)]
pub struct EntropyNoise(SmallRng);

impl EntropyNoise {
    pub fn new() -> Self {
        Self(SmallRng::from_entropy())
    }
}

impl Default for EntropyNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for EntropyNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.0.gen_range(low..high)
    }
}

/// Always returns the same factor; `ConstantNoise(1.0)` disables noise.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn uniform(&mut self, _low: f64, _high: f64) -> f64 {
        self.0
    }
}

/// Replays a recorded sequence of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceNoise {
    draws: Vec<f64>,
    cursor: usize,
}

impl SequenceNoise {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }
}

impl NoiseSource for SequenceNoise {
    fn uniform(&mut self, _low: f64, _high: f64) -> f64 {
        if self.draws.is_empty() {
            return 1.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSample {
    pub day: u32,
    pub abundances: AbundanceVector,
}

/// Rescales the vector so it sums to 100. An all-zero vector stays all-zero.
pub fn renormalize(abundances: &mut AbundanceVector) {
    let total: f64 = abundances.iter().sum();
    let divisor = if total == 0.0 { 1.0 } else { total };
    for value in abundances.iter_mut() {
        *value = *value / divisor * 100.0;
    }
}

/// Advances one week in place.
pub fn step(abundances: &mut AbundanceVector, delta: &AbundanceVector, noise: &mut dyn NoiseSource) {
    for (value, d) in abundances.iter_mut().zip(delta.iter()) {
        *value += d * DAYS_PER_STEP as f64 * PERCENT_SCALE;
        *value *= noise.uniform(NOISE_LOW, NOISE_HIGH);
        if *value < 0.0 {
            *value = 0.0;
        }
    }
    renormalize(abundances);
}

/// Runs one phase of `total_days`, labeling samples from `day_offset`.
///
/// The first sample is always `start` unchanged at `day_offset`; one sample
/// follows per completed week while `day <= total_days`. A trailing partial
/// week is dropped, so `total_days < 7` yields the seed only.
///
/// Fails with [`SessionError::PhaseTooLong`] when `total_days` exceeds
/// [`MAX_PHASE_DAYS`] or the last day label would not fit in a `u32`.
pub fn run_phase<S: AsRef<str>>(
    start: &AbundanceVector,
    factors: &[S],
    total_days: u32,
    day_offset: u32,
    noise: &mut dyn NoiseSource,
) -> Result<Vec<PhaseSample>, SessionError> {
    if total_days > MAX_PHASE_DAYS || day_offset.checked_add(total_days).is_none() {
        return Err(SessionError::PhaseTooLong(total_days));
    }
    let delta = combined_delta(factors);
    let weeks = total_days / DAYS_PER_STEP;
    let mut abundances = *start;
    let mut samples = Vec::with_capacity(weeks as usize + 1);
    samples.push(PhaseSample {
        day: day_offset,
        abundances,
    });

    // week * 7 <= total_days, and day_offset + total_days was checked above
    for week in 1..=weeks {
        step(&mut abundances, &delta, noise);
        samples.push(PhaseSample {
            day: day_offset + week * DAYS_PER_STEP,
            abundances,
        });
    }
    Ok(samples)
}
