//! Scaler and classifier capabilities.
//!
//! The pipeline only depends on the [`Scaler`] and [`RiskClassifier`] traits.
//! Fitted parameters come from a JSON [`ModelBundle`]; how those parameters
//! are produced is outside this crate.

pub mod logistic;
pub mod scaler;

use crate::core::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use logistic::LogisticClassifier;
pub use scaler::StandardScaler;

/// Normalizes a feature vector, preserving field order.
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Maps a normalized feature vector to a risk probability in [0, 1].
pub trait RiskClassifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
}

/// Serialized scaler and classifier parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Must match the pipeline's feature order exactly
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: LogisticClassifier,
}

impl ModelBundle {
    /// Load a bundle from a JSON file and check it against the feature order.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let bundle: ModelBundle = serde_json::from_str(json)?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check feature names and parameter shapes.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(a, b)| a != b)
        {
            return Err(ModelError::FeatureOrder(format!(
                "expected {:?}, got {:?}",
                FEATURE_NAMES, self.feature_names
            )));
        }
        self.scaler.check_shape(FEATURE_COUNT)?;
        self.classifier.check_shape(FEATURE_COUNT)?;
        Ok(())
    }

    /// Built-in parameters used when no model file is configured.
    pub fn reference() -> Self {
        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler: StandardScaler::new(
                vec![80.0, 8.0, 29.5, 80.0, 12.0, 0.0],
                vec![15.0, 4.8, 17.3, 6.0, 5.0, 20.0],
            ),
            classifier: LogisticClassifier::new(vec![1.2, 0.05, 0.0, 0.4, 0.35, 0.5], -1.6),
        }
    }

    /// Split into shareable trait objects.
    pub fn into_parts(self) -> (Arc<dyn Scaler>, Arc<dyn RiskClassifier>) {
        (Arc::new(self.scaler), Arc::new(self.classifier))
    }
}
