//! Threshold decisioning and per-reading result records.

use crate::analysis::Activity;
use crate::core::features::FeatureVector;
use crate::core::history::TrendSnapshot;
use crate::source::Reading;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Probability at or above which a reading is flagged as elevated risk.
pub const RISK_THRESHOLD: f64 = 0.3;

/// The name of this producer, stamped on exported updates.
pub const PRODUCER_NAME: &str = "panic-predictor";

/// Classifier output plus the threshold flag and attributed cause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Risk probability in [0, 1]
    pub probability: f64,
    /// `probability >= threshold`
    pub is_risk: bool,
    /// Likely trigger, only set when `is_risk`
    pub attributed_activity: Option<Activity>,
}

impl Decision {
    /// Apply the threshold rule. `sampled` is only attributed when at risk.
    pub fn from_probability(probability: f64, threshold: f64, sampled: Activity) -> Self {
        let is_risk = is_risk(probability, threshold);
        Self {
            probability,
            is_risk,
            attributed_activity: if is_risk { Some(sampled) } else { None },
        }
    }

    /// Display label for the likely cause ("None" when not at risk).
    pub fn likely_cause(&self) -> &'static str {
        self.attributed_activity
            .map(|a| a.as_str())
            .unwrap_or("None")
    }

    /// Probability scaled to 0-100.
    pub fn probability_pct(&self) -> f64 {
        self.probability * 100.0
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_risk {
            "High Risk"
        } else {
            "Safe"
        }
    }
}

/// Inclusive threshold comparison.
pub fn is_risk(probability: f64, threshold: f64) -> bool {
    probability >= threshold
}

/// Everything a continuous session emits for one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamUpdate {
    pub producer: String,
    pub session_id: Uuid,
    /// 1-based iteration number within the session
    pub sequence: u64,
    pub reading: Reading,
    pub features: FeatureVector,
    pub decision: Decision,
    /// Activity drawn for this reading, attributed or not
    pub sampled_activity: Activity,
    /// Standard deviation of recent heart rates
    pub hrv: f64,
    pub trend: TrendSnapshot,
}

impl StreamUpdate {
    /// One-line status for terminal display.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] HR: {:.1} | {} ({:.2}%) | Likely Cause: {}",
            self.reading.timestamp.format("%H:%M:%S"),
            self.reading.value,
            self.decision.status_label(),
            self.decision.probability_pct(),
            self.decision.likely_cause()
        )
    }
}
