//! Deterministic stand-in training data for when no raw logs are available.
//!
//! Cells degrade linearly with cycle count: voltage sags, temperature creeps
//! up, current stays around the nominal discharge rate. Each signal carries
//! gaussian noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::dataset::CycleFeatureRow;

pub const DEFAULT_SAMPLES: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;

/// Lifetime used to label synthetic rows: `rul = max(0, LIFETIME_CYCLES - cycle)`.
pub const LIFETIME_CYCLES: u32 = 1500;

const MIN_CYCLE: u32 = 1;
const MAX_CYCLE_EXCLUSIVE: u32 = 1000;

fn gaussian(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

pub fn generate(samples: usize, seed: u64) -> Vec<CycleFeatureRow> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..samples)
        .map(|_| {
            let cycle = rng.gen_range(MIN_CYCLE..MAX_CYCLE_EXCLUSIVE);
            let c = cycle as f64;
            CycleFeatureRow {
                cycle,
                voltage_mean: 4.2 - c * 0.0005 + gaussian(&mut rng, 0.0, 0.01),
                current_mean: gaussian(&mut rng, -2.0, 0.1),
                temperature_mean: 24.0 + c * 0.01 + gaussian(&mut rng, 0.0, 0.5),
                time_max: None,
                rul: LIFETIME_CYCLES.saturating_sub(cycle),
            }
        })
        .collect()
}
