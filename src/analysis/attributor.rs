//! Weighted activity attribution.
//!
//! Draws a plausible trigger in proportion to historical risk. The draw is
//! random on purpose: it estimates what was likely going on, it does not
//! observe it.

use crate::analysis::table::RiskTable;
use crate::error::PipelineError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Normalize a risk table into `(key, probability)` pairs.
///
/// Fails when any value is negative or non-finite, or when the values sum
/// to zero.
pub fn normalized_weights<K: Ord + Clone>(
    table: &RiskTable<K>,
) -> Result<Vec<(K, f64)>, PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::UndefinedDistribution(
            "risk table is empty".to_string(),
        ));
    }
    if table.iter().any(|(_, v)| !v.is_finite() || v < 0.0) {
        return Err(PipelineError::UndefinedDistribution(
            "risk table contains negative or non-finite values".to_string(),
        ));
    }

    let sum: f64 = table.iter().map(|(_, v)| v).sum();
    if sum <= 0.0 {
        return Err(PipelineError::UndefinedDistribution(format!(
            "risk values sum to {sum}"
        )));
    }

    Ok(table.iter().map(|(k, v)| (k.clone(), v / sum)).collect())
}

/// Samples activities from a risk table.
pub struct ActivityAttributor<R: Rng = StdRng> {
    rng: R,
}

impl ActivityAttributor<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for ActivityAttributor<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ActivityAttributor<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one key with probability proportional to its risk.
    pub fn sample<K: Ord + Clone>(&mut self, table: &RiskTable<K>) -> Result<K, PipelineError> {
        let weights = normalized_weights(table)?;
        let index = WeightedIndex::new(weights.iter().map(|(_, w)| *w))
            .map_err(|e| PipelineError::UndefinedDistribution(e.to_string()))?;
        let picked = index.sample(&mut self.rng);
        Ok(weights[picked].0.clone())
    }
}
