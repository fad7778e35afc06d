//! Configuration for the panic predictor.

use crate::core::decision::RISK_THRESHOLD;
use crate::core::history::{DEFAULT_HISTORY_CAPACITY, DEFAULT_TREND_CAPACITY};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pause between continuous-mode readings
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,

    /// Number of readings used for rolling statistics
    pub history_capacity: usize,

    /// Number of points kept in the live trend
    pub trend_capacity: usize,

    /// Probability at or above which a reading is flagged
    pub risk_threshold: f64,

    /// IANA timezone used for the hour/minute features
    pub timezone: String,

    /// Historical dataset CSV (regenerated if missing or malformed)
    pub dataset_path: PathBuf,

    /// Optional JSON model bundle; the built-in reference model is used if unset
    pub model_path: Option<PathBuf>,

    /// Path for storing session statistics
    pub data_path: PathBuf,

    /// Path for exported stream updates
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("panic-predictor");

        Self {
            sample_interval: Duration::from_secs(5),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            trend_capacity: DEFAULT_TREND_CAPACITY,
            risk_threshold: RISK_THRESHOLD,
            timezone: "UTC".to_string(),
            dataset_path: data_dir.join("panic_attack_data.csv"),
            model_path: None,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("panic-predictor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Parsed feature timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Path of the persisted session statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("session_stats.json")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(ConfigError::Invalid(format!(
                "risk_threshold must be within [0, 1], got {}",
                self.risk_threshold
            )));
        }
        if self.history_capacity == 0 || self.trend_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity and trend_capacity must be at least 1".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
