//! Standard (z-score) scaler.

use crate::error::ModelError;
use crate::model::Scaler;
use serde::{Deserialize, Serialize};

/// `(x - mean) / scale` per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub(crate) fn check_shape(&self, expected: usize) -> Result<(), ModelError> {
        for len in [self.mean.len(), self.scale.len()] {
            if len != expected {
                return Err(ModelError::ShapeMismatch {
                    expected,
                    actual: len,
                });
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_shape(self.mean.len())?;
        if features.len() != self.mean.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                // Constant training columns carry a zero scale
                if *scale == 0.0 {
                    x - mean
                } else {
                    (x - mean) / scale
                }
            })
            .collect())
    }
}
