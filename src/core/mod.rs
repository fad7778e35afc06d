//! Core streaming pipeline.
//!
//! This module contains:
//! - Bounded history and trend buffers
//! - Feature vector assembly
//! - Threshold decisioning and result records

pub mod decision;
pub mod features;
pub mod history;

// Re-export commonly used types
pub use decision::{is_risk, Decision, StreamUpdate, PRODUCER_NAME, RISK_THRESHOLD};
pub use features::{
    Clock, FeatureBuilder, FeatureVector, FixedClock, SystemClock, FEATURE_COUNT, FEATURE_NAMES,
};
pub use history::{
    HistoryBuffer, TrendPoint, TrendSnapshot, TrendState, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_TREND_CAPACITY,
};
