//! Historical risk analysis.
//!
//! This module contains:
//! - The labeled historical record type and its CSV dataset
//! - Risk-by-key tables (hour of day, activity)
//! - The compute-once aggregate analyzer
//! - Weighted activity attribution

pub mod aggregate;
pub mod attributor;
pub mod dataset;
pub mod table;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use aggregate::{AggregateRiskAnalyzer, DatasetSource, RiskSummary, RiskTables};
pub use attributor::ActivityAttributor;
pub use dataset::{load_or_synthesize, synthesize, Dataset, DatasetOrigin, SYNTHETIC_RECORD_COUNT};
pub use table::{RiskEntry, RiskTable};

/// Guidance for high-risk times, independent of activity.
pub const GENERAL_PRECAUTIONS: [&str; 4] = [
    "Take sensory breaks in a quiet space.",
    "Practice deep breathing or use a calming object.",
    "Wear noise-canceling headphones or sunglasses.",
    "Have a trusted person check in.",
];

/// Behavioral context a reading is attributed to.
///
/// Variants are declared in name order so keyed tables list them
/// alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    #[serde(rename = "Loud Environment")]
    LoudEnvironment,
    #[serde(rename = "Quiet Rest")]
    QuietRest,
    #[serde(rename = "Routine Change")]
    RoutineChange,
    #[serde(rename = "Screen Time")]
    ScreenTime,
    #[serde(rename = "Social Interaction")]
    SocialInteraction,
}

impl Activity {
    pub const ALL: [Activity; 5] = [
        Activity::LoudEnvironment,
        Activity::QuietRest,
        Activity::RoutineChange,
        Activity::ScreenTime,
        Activity::SocialInteraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::LoudEnvironment => "Loud Environment",
            Activity::QuietRest => "Quiet Rest",
            Activity::RoutineChange => "Routine Change",
            Activity::ScreenTime => "Screen Time",
            Activity::SocialInteraction => "Social Interaction",
        }
    }

    /// Activities that raise the risk of the following record in synthetic
    /// history.
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            Activity::SocialInteraction | Activity::LoudEnvironment | Activity::RoutineChange
        )
    }

    /// Practical guidance for this activity, if any.
    pub fn precaution(&self) -> Option<&'static str> {
        match self {
            Activity::SocialInteraction => Some("Limit duration, prepare a quiet exit plan."),
            Activity::LoudEnvironment => Some("Use ear protection, avoid prolonged exposure."),
            Activity::RoutineChange => {
                Some("Plan transitions in advance, use visual schedules.")
            }
            Activity::ScreenTime => Some("Take frequent breaks, dim screens."),
            Activity::QuietRest => None,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activity::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown activity: {s}"))
    }
}

/// One labeled historical observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    #[serde(with = "dataset::timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub heart_rate: f64,
    #[serde(with = "dataset::flag_format")]
    pub panic_attack: bool,
    pub activity: Activity,
}

impl RiskRecord {
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}
