//! Aggregate risk-by-hour and risk-by-activity analysis.
//!
//! Tables are computed once per analyzer and shared afterwards. The first
//! caller of [`AggregateRiskAnalyzer::tables`] loads (or synthesizes) the
//! dataset; every other caller, on any thread, gets the same `Arc`.

use crate::analysis::dataset::{self, DatasetOrigin};
use crate::analysis::table::RiskTable;
use crate::analysis::{Activity, RiskRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// The two aggregate tables plus dataset provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTables {
    pub hourly: RiskTable<u32>,
    pub activity: RiskTable<Activity>,
    pub record_count: usize,
    pub origin: DatasetOrigin,
}

impl RiskTables {
    /// Payload for static summaries.
    pub fn summary(&self) -> RiskSummary {
        RiskSummary {
            hourly: self.hourly.clone(),
            activity: self.activity.clone(),
            high_risk_hours: self.hourly.high_risk(),
            high_risk_activities: self.activity.high_risk(),
        }
    }
}

/// Risk tables with their above-average subsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub hourly: RiskTable<u32>,
    pub activity: RiskTable<Activity>,
    pub high_risk_hours: Vec<u32>,
    pub high_risk_activities: Vec<Activity>,
}

/// Where historical records come from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// CSV file, regenerated and written back if unusable
    File(PathBuf),
    /// In-memory records; synthesized if empty
    Records(Vec<RiskRecord>),
    /// Always synthesize, never persist
    Synthetic,
}

/// Compute-once aggregate analyzer.
#[derive(Debug)]
pub struct AggregateRiskAnalyzer {
    source: DatasetSource,
    seed: Option<u64>,
    tables: OnceLock<Arc<RiskTables>>,
}

impl AggregateRiskAnalyzer {
    pub fn new(source: DatasetSource) -> Self {
        Self {
            source,
            seed: None,
            tables: OnceLock::new(),
        }
    }

    /// Fix the RNG seed used if synthesis is needed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Tables for this analyzer, computed on first call.
    pub fn tables(&self) -> Arc<RiskTables> {
        self.tables
            .get_or_init(|| Arc::new(self.compute()))
            .clone()
    }

    /// Whether the tables have been computed yet.
    pub fn is_computed(&self) -> bool {
        self.tables.get().is_some()
    }

    fn compute(&self) -> RiskTables {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (records, origin) = match &self.source {
            DatasetSource::File(path) => {
                let dataset = dataset::load_or_synthesize(path, &mut rng);
                (dataset.records, dataset.origin)
            }
            DatasetSource::Records(records) if !records.is_empty() => {
                (records.clone(), DatasetOrigin::Loaded)
            }
            DatasetSource::Records(_) | DatasetSource::Synthetic => {
                (dataset::synthesize(&mut rng), DatasetOrigin::Synthesized)
            }
        };

        let tables = analyze(&records, origin);
        tracing::info!(
            records = tables.record_count,
            hours = tables.hourly.len(),
            activities = tables.activity.len(),
            origin = ?origin,
            "Computed aggregate risk tables"
        );
        tables
    }
}

/// Group records by hour and by activity.
pub fn analyze(records: &[RiskRecord], origin: DatasetOrigin) -> RiskTables {
    RiskTables {
        hourly: RiskTable::from_records(records, |r| r.hour()),
        activity: RiskTable::from_records(records, |r| r.activity),
        record_count: records.len(),
        origin,
    }
}
