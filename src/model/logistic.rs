//! Logistic-regression risk classifier.

use crate::error::ModelError;
use crate::model::RiskClassifier;
use serde::{Deserialize, Serialize};

/// `sigmoid(w · x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub(crate) fn check_shape(&self, expected: usize) -> Result<(), ModelError> {
        if self.coefficients.len() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: self.coefficients.len(),
            });
        }
        Ok(())
    }
}

impl RiskClassifier for LogisticClassifier {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let z: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        let probability = sigmoid(z);

        if !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::InvalidProbability(probability));
        }
        Ok(probability)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
