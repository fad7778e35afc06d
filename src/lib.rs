//! Panic Predictor - streaming heart-rate risk classification.
//!
//! This library turns a stream of heart-rate readings into rolling features,
//! classifies each reading as elevated panic-attack risk or not, and
//! attributes a likely behavioral trigger from historical risk-by-activity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Panic Predictor                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Source    │──▶│   History   │──▶│  Features   │        │
//! │  │ (simulated) │   │ (10 values) │   │ (6 fields)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                             │               │
//! │  ┌─────────────┐   ┌─────────────┐          ▼               │
//! │  │  Aggregate  │──▶│ Attributor  │   ┌─────────────┐        │
//! │  │  Analyzer   │   │ (weighted)  │──▶│  Decision   │──▶ Trend│
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use panic_predictor::analysis::{AggregateRiskAnalyzer, DatasetSource};
//! use panic_predictor::config::Config;
//! use panic_predictor::session::{RiskContext, StreamingSession};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let analyzer = AggregateRiskAnalyzer::new(DatasetSource::File(config.dataset_path.clone()));
//! let context = Arc::new(RiskContext::from_config(&config, &analyzer).unwrap());
//!
//! let mut session = StreamingSession::new(context);
//! let decision = session.evaluate(118.0).unwrap();
//! println!("{} ({:.1}%)", decision.status_label(), decision.probability_pct());
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod model;
pub mod session;
pub mod source;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use analysis::{
    Activity, ActivityAttributor, AggregateRiskAnalyzer, DatasetSource, RiskRecord, RiskSummary,
    RiskTable, RiskTables,
};
pub use config::{Config, ConfigError};
pub use core::{Decision, FeatureBuilder, FeatureVector, HistoryBuffer, StreamUpdate, TrendSnapshot};
pub use error::{DatasetError, ModelError, PipelineError, PipelineStage, SourceError};
pub use model::{LogisticClassifier, ModelBundle, RiskClassifier, Scaler, StandardScaler};
pub use session::{CancellationToken, RiskContext, RunSummary, StopReason, StreamingSession};
pub use source::{ChannelSource, Reading, ReadingSource, ReplaySource, SimulatedSource};
pub use transparency::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Disclaimer shown by the CLI before monitoring starts.
pub const DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 PANIC PREDICTOR - PLEASE READ                    ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Risk estimates come from heart-rate patterns and historical     ║
║  averages. They are not a diagnosis.                             ║
║                                                                  ║
║  ✓ WHAT IS USED:                                                 ║
║    • The last 10 heart-rate readings                             ║
║    • Time of day                                                 ║
║    • Historical risk by hour and by activity                     ║
║                                                                  ║
║  ✗ WHAT IS NOT KNOWN:                                            ║
║    • What you are actually doing (the cause is an estimate)      ║
║    • Anything beyond heart rate                                  ║
║                                                                  ║
║  Readings are processed locally and only the last 10 are kept.   ║
║                                                                  ║
║  You can view evaluation statistics anytime with:                ║
║    panic-predictor status                                        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_contents() {
        assert!(DISCLAIMER.contains("not a diagnosis"));
        assert!(DISCLAIMER.contains("panic-predictor status"));
    }
}
