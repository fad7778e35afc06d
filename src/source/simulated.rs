//! Simulated heart-rate source.

use crate::error::SourceError;
use crate::session::CancellationToken;
use crate::source::types::{clamp_heart_rate, Reading};
use crate::source::ReadingSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

/// Mean of the simulated heart rate (bpm).
pub const SIMULATED_MEAN_BPM: f64 = 80.0;

/// Standard deviation of the simulated heart rate (bpm).
pub const SIMULATED_STD_BPM: f64 = 15.0;

/// Draws readings from Normal(80, 15), clamped to the accepted range.
pub struct SimulatedSource<R: Rng = StdRng> {
    rng: R,
    distribution: Normal,
}

impl SimulatedSource<StdRng> {
    /// Create a source seeded from system entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a deterministic source.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimulatedSource<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SimulatedSource<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            distribution: reference_distribution(),
        }
    }

    /// Draw a raw heart-rate value (clamped, not stamped).
    pub fn sample_value(&mut self) -> f64 {
        clamp_heart_rate(self.rng.sample(&self.distribution))
    }
}

impl<R: Rng> ReadingSource for SimulatedSource<R> {
    fn next_reading(&mut self, _token: &CancellationToken) -> Result<Reading, SourceError> {
        Ok(Reading::now(self.rng.sample(&self.distribution)))
    }
}

/// The heart-rate distribution used for simulation and synthetic history.
pub(crate) fn reference_distribution() -> Normal {
    // Constant parameters are valid: std > 0 and both finite.
    match Normal::new(SIMULATED_MEAN_BPM, SIMULATED_STD_BPM) {
        Ok(normal) => normal,
        Err(_) => unreachable!("reference normal parameters are valid"),
    }
}
