//! Feature vector assembly.
//!
//! The classifier is fitted against exactly six fields in a fixed order:
//! `[heart_rate, hour, minute, hr_rolling_mean, hr_rolling_std, hr_change]`.
//! Rolling statistics are computed after the current reading has been pushed,
//! so each reading contributes to its own mean and std.

use crate::core::history::HistoryBuffer;
use crate::error::PipelineError;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Number of fields in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 6;

/// Field names in classifier order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "heart_rate",
    "hour",
    "minute",
    "hr_rolling_mean",
    "hr_rolling_std",
    "hr_change",
];

/// Classifier input for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub heart_rate: f64,
    /// Hour of day (0-23) in the configured timezone
    pub hour: u32,
    /// Minute of hour (0-59) in the configured timezone
    pub minute: u32,
    pub hr_rolling_mean: f64,
    pub hr_rolling_std: f64,
    /// Current minus previous reading, 0 when there is no previous reading
    pub hr_change: f64,
}

impl FeatureVector {
    /// Fields in classifier order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.heart_rate,
            self.hour as f64,
            self.minute as f64,
            self.hr_rolling_mean,
            self.hr_rolling_std,
            self.hr_change,
        ]
    }
}

/// Source of "now" for feature timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builds feature vectors, extracting time-of-day in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    timezone: Tz,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl FeatureBuilder {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Push `current_hr` into `buffer` and assemble the feature vector.
    ///
    /// Non-finite heart rates are rejected before the buffer is touched.
    pub fn build(
        &self,
        current_hr: f64,
        buffer: &mut HistoryBuffer,
        now: DateTime<Utc>,
    ) -> Result<FeatureVector, PipelineError> {
        if !current_hr.is_finite() {
            return Err(PipelineError::FeatureBuild(format!(
                "heart rate {current_hr} is not finite"
            )));
        }

        buffer.push(current_hr);
        let local = now.with_timezone(&self.timezone);

        Ok(FeatureVector {
            heart_rate: current_hr,
            hour: local.hour(),
            minute: local.minute(),
            hr_rolling_mean: buffer.mean(),
            hr_rolling_std: buffer.std(),
            hr_change: buffer.last_delta(current_hr),
        })
    }
}
