//! Bounded history for rolling statistics and live trend display.
//!
//! [`HistoryBuffer`] is the rolling window feeding the feature builder.
//! [`TrendState`] is the window of recent results a continuous session keeps
//! for visualization. Both evict their oldest entries once full.

use crate::analysis::Activity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Default number of heart-rate values used for rolling statistics.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Default number of points kept in the live trend.
pub const DEFAULT_TREND_CAPACITY: usize = 10;

/// Fixed-capacity sliding window over recent heart-rate values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a value, evicting the oldest once over capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Population mean of the current contents, or 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().mean()
    }

    /// Population standard deviation of the current contents, or 0 when empty.
    pub fn std(&self) -> f64 {
        population_std(self.values.iter())
    }

    /// Change from the second-to-last value to `current`.
    ///
    /// Called after `current` has been pushed; returns 0 until at least two
    /// values are held.
    pub fn last_delta(&self, current: f64) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        current - self.values[n - 2]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contents, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// One point appended to the trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub heart_rate: f64,
    /// Risk probability scaled to 0-100
    pub probability_pct: f64,
    pub hrv: f64,
    pub activity: Activity,
}

/// Recent-result series for a running session.
///
/// All five series are appended and trimmed together so index `i` always
/// refers to the same iteration.
#[derive(Debug, Clone)]
pub struct TrendState {
    timestamps: VecDeque<DateTime<Utc>>,
    heart_rate: VecDeque<f64>,
    probability_pct: VecDeque<f64>,
    hrv: VecDeque<f64>,
    activity: VecDeque<Activity>,
    capacity: usize,
}

impl Default for TrendState {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_CAPACITY)
    }
}

impl TrendState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            timestamps: VecDeque::with_capacity(capacity + 1),
            heart_rate: VecDeque::with_capacity(capacity + 1),
            probability_pct: VecDeque::with_capacity(capacity + 1),
            hrv: VecDeque::with_capacity(capacity + 1),
            activity: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// HRV that a new heart-rate value would get: standard deviation of the
    /// last `capacity` heart rates including `heart_rate`, or 0 with fewer
    /// than two samples.
    pub fn hrv_with(&self, heart_rate: f64) -> f64 {
        let keep = self.capacity.saturating_sub(1);
        let skip = self.heart_rate.len().saturating_sub(keep);
        let window: Vec<f64> = self
            .heart_rate
            .iter()
            .skip(skip)
            .copied()
            .chain(std::iter::once(heart_rate))
            .collect();
        if window.len() < 2 {
            return 0.0;
        }
        population_std(window.iter())
    }

    /// Append a point to every series, then trim all of them together.
    pub fn push(&mut self, point: TrendPoint) {
        self.timestamps.push_back(point.timestamp);
        self.heart_rate.push_back(point.heart_rate);
        self.probability_pct.push_back(point.probability_pct);
        self.hrv.push_back(point.hrv);
        self.activity.push_back(point.activity);

        while self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
            self.heart_rate.pop_front();
            self.probability_pct.pop_front();
            self.hrv.pop_front();
            self.activity.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy the current series out for a consumer.
    pub fn snapshot(&self) -> TrendSnapshot {
        TrendSnapshot {
            timestamps: self.timestamps.iter().copied().collect(),
            heart_rate: self.heart_rate.iter().copied().collect(),
            probability_pct: self.probability_pct.iter().copied().collect(),
            hrv: self.hrv.iter().copied().collect(),
            activity: self.activity.iter().copied().collect(),
        }
    }
}

/// Plain-data copy of a [`TrendState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub timestamps: Vec<DateTime<Utc>>,
    pub heart_rate: Vec<f64>,
    pub probability_pct: Vec<f64>,
    pub hrv: Vec<f64>,
    pub activity: Vec<Activity>,
}

impl TrendSnapshot {
    /// Whether every series has the same length.
    pub fn is_aligned(&self) -> bool {
        let n = self.timestamps.len();
        self.heart_rate.len() == n
            && self.probability_pct.len() == n
            && self.hrv.len() == n
            && self.activity.len() == n
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

fn population_std<'a>(values: impl Iterator<Item = &'a f64> + Clone) -> f64 {
    if values.clone().next().is_none() {
        return 0.0;
    }
    values.population_std_dev()
}
