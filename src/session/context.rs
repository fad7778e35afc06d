//! Immutable context shared by sessions.
//!
//! Built once at startup from the aggregate tables and the model, then handed
//! to every [`StreamingSession`](super::StreamingSession) behind an `Arc`.

use crate::analysis::{AggregateRiskAnalyzer, RiskTables};
use crate::config::{Config, ConfigError};
use crate::core::decision::RISK_THRESHOLD;
use crate::core::features::FeatureVector;
use crate::core::history::{DEFAULT_HISTORY_CAPACITY, DEFAULT_TREND_CAPACITY};
use crate::error::{ModelError, PipelineError};
use crate::model::{ModelBundle, RiskClassifier, Scaler};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors building a [`RiskContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Everything a session needs that does not change while it runs.
pub struct RiskContext {
    tables: Arc<RiskTables>,
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn RiskClassifier>,
    threshold: f64,
    timezone: Tz,
    history_capacity: usize,
    trend_capacity: usize,
    sample_interval: Duration,
}

impl std::fmt::Debug for RiskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskContext")
            .field("record_count", &self.tables.record_count)
            .field("threshold", &self.threshold)
            .field("timezone", &self.timezone)
            .field("history_capacity", &self.history_capacity)
            .field("trend_capacity", &self.trend_capacity)
            .field("sample_interval", &self.sample_interval)
            .finish()
    }
}

impl RiskContext {
    /// A context with default threshold, capacities, timezone and interval.
    pub fn new(
        tables: Arc<RiskTables>,
        scaler: Arc<dyn Scaler>,
        classifier: Arc<dyn RiskClassifier>,
    ) -> Self {
        Self {
            tables,
            scaler,
            classifier,
            threshold: RISK_THRESHOLD,
            timezone: Tz::UTC,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            trend_capacity: DEFAULT_TREND_CAPACITY,
            sample_interval: Duration::from_secs(5),
        }
    }

    /// Build from configuration: load the model bundle (or the reference
    /// model) and take the analyzer's tables.
    pub fn from_config(
        config: &Config,
        analyzer: &AggregateRiskAnalyzer,
    ) -> Result<Self, ContextError> {
        config.validate()?;

        let bundle = match &config.model_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading model bundle");
                ModelBundle::load(path)?
            }
            None => {
                tracing::info!("No model configured, using reference model");
                ModelBundle::reference()
            }
        };
        let (scaler, classifier) = bundle.into_parts();

        Ok(Self::new(analyzer.tables(), scaler, classifier)
            .with_threshold(config.risk_threshold)
            .with_timezone(config.tz()?)
            .with_capacities(config.history_capacity, config.trend_capacity)
            .with_sample_interval(config.sample_interval))
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_capacities(mut self, history: usize, trend: usize) -> Self {
        self.history_capacity = history;
        self.trend_capacity = trend;
        self
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Scale and classify a feature vector.
    pub fn classify(&self, features: &FeatureVector) -> Result<f64, PipelineError> {
        let scaled = self
            .scaler
            .transform(&features.to_array())
            .map_err(PipelineError::Scale)?;
        let probability = self
            .classifier
            .predict(&scaled)
            .map_err(PipelineError::Classify)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(PipelineError::Classify(ModelError::InvalidProbability(
                probability,
            )));
        }
        Ok(probability)
    }

    pub fn tables(&self) -> &RiskTables {
        &self.tables
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn trend_capacity(&self) -> usize {
        self.trend_capacity
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }
}
