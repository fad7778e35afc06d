//! Error types for the panic predictor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage that produced a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Acquire,
    FeatureBuild,
    Scale,
    Classify,
    Attribute,
}

/// Errors that abort a single evaluation.
///
/// None of these are substituted with a default probability; the caller
/// decides whether the session continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Reading source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Feature build failed: {0}")]
    FeatureBuild(String),

    #[error("Scaling failed: {0}")]
    Scale(#[source] ModelError),

    #[error("Classification failed: {0}")]
    Classify(#[source] ModelError),

    #[error("Undefined activity distribution: {0}")]
    UndefinedDistribution(String),
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Source(_) => PipelineStage::Acquire,
            PipelineError::FeatureBuild(_) => PipelineStage::FeatureBuild,
            PipelineError::Scale(_) => PipelineStage::Scale,
            PipelineError::Classify(_) => PipelineStage::Classify,
            PipelineError::UndefinedDistribution(_) => PipelineStage::Attribute,
        }
    }
}

/// Errors raised by scaler and classifier implementations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Classifier produced an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Feature order mismatch: {0}")]
    FeatureOrder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors reading the historical dataset. Always recovered by regeneration.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset schema error: {0}")]
    Schema(String),
}

/// Errors from a reading source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Reading source disconnected")]
    Disconnected,

    #[error("Reading source exhausted")]
    Exhausted,

    #[error("Reading cancelled while waiting")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let err = PipelineError::Scale(ModelError::ShapeMismatch {
            expected: 6,
            actual: 5,
        });
        assert_eq!(err.stage(), PipelineStage::Scale);
        assert!(err.to_string().contains("expected 6"));

        let err = PipelineError::Classify(ModelError::InvalidProbability(1.5));
        assert_eq!(err.stage(), PipelineStage::Classify);

        let err: PipelineError = SourceError::Exhausted.into();
        assert_eq!(err.stage(), PipelineStage::Acquire);

        let err = PipelineError::UndefinedDistribution("all weights zero".into());
        assert_eq!(err.stage(), PipelineStage::Attribute);
    }
}
