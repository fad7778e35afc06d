//! Heart-rate reading type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest heart rate accepted into the pipeline (bpm).
pub const MIN_HEART_RATE: f64 = 40.0;

/// Highest heart rate accepted into the pipeline (bpm).
pub const MAX_HEART_RATE: f64 = 160.0;

/// A single heart-rate observation.
///
/// Values are clamped to `[MIN_HEART_RATE, MAX_HEART_RATE]` on construction.
/// Non-finite values pass through unchanged and are rejected by the feature
/// builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Heart rate in beats per minute
    pub value: f64,
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: clamp_heart_rate(value),
            timestamp,
        }
    }

    /// Create a reading stamped with the current time.
    pub fn now(value: f64) -> Self {
        Self::new(value, Utc::now())
    }
}

/// Clamp a heart rate into the accepted range.
pub fn clamp_heart_rate(value: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    value.clamp(MIN_HEART_RATE, MAX_HEART_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_clamps() {
        assert_eq!(Reading::now(20.0).value, MIN_HEART_RATE);
        assert_eq!(Reading::now(250.0).value, MAX_HEART_RATE);
        assert_eq!(Reading::now(82.5).value, 82.5);
    }

    #[test]
    fn test_nan_is_not_clamped() {
        assert!(Reading::now(f64::NAN).value.is_nan());
    }
}
