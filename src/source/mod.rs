//! Heart-rate reading sources.
//!
//! A source yields the next reading for the continuous loop. Three are
//! provided:
//! - [`SimulatedSource`] draws from a normal distribution (the reference behavior)
//! - [`ChannelSource`] receives readings pushed by a sensor thread
//! - [`ReplaySource`] replays a fixed list of values

pub mod channel;
pub mod simulated;
pub mod types;

use crate::error::SourceError;
use crate::session::CancellationToken;

pub use channel::{ChannelSource, ReadingSender};
pub use simulated::SimulatedSource;
pub use types::{clamp_heart_rate, Reading, MAX_HEART_RATE, MIN_HEART_RATE};

/// Anything that can produce heart-rate readings.
pub trait ReadingSource {
    /// Block until the next reading is available.
    ///
    /// Sources that can wait must return [`SourceError::Cancelled`] as soon
    /// as `token` is cancelled.
    fn next_reading(&mut self, token: &CancellationToken) -> Result<Reading, SourceError>;
}

/// Replays a fixed sequence of heart-rate values, stamped at read time.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    values: std::collections::VecDeque<f64>,
}

impl ReplaySource {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Number of values not yet replayed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl ReadingSource for ReplaySource {
    fn next_reading(&mut self, _token: &CancellationToken) -> Result<Reading, SourceError> {
        self.values
            .pop_front()
            .map(Reading::now)
            .ok_or(SourceError::Exhausted)
    }
}
