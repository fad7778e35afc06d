//! Risk-by-key tables.

use crate::analysis::RiskRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome statistics for one key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    /// Share of positive outcomes, 0-100
    pub risk_pct: f64,
    /// Number of records grouped under this key
    pub count: usize,
}

/// Percentage of positive outcomes grouped by a context key.
///
/// Keys iterate in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTable<K: Ord> {
    entries: BTreeMap<K, RiskEntry>,
}

impl<K: Ord> Default for RiskTable<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> RiskTable<K> {
    /// Group `records` by `key` and average the outcome flag.
    pub fn from_records<F>(records: &[RiskRecord], key: F) -> Self
    where
        F: Fn(&RiskRecord) -> K,
    {
        let mut tallies: BTreeMap<K, (usize, usize)> = BTreeMap::new();
        for record in records {
            let tally = tallies.entry(key(record)).or_insert((0, 0));
            tally.0 += 1;
            tally.1 += usize::from(record.panic_attack);
        }

        let entries = tallies
            .into_iter()
            .map(|(k, (count, positives))| {
                let risk_pct = positives as f64 / count as f64 * 100.0;
                (k, RiskEntry { risk_pct, count })
            })
            .collect();

        Self { entries }
    }

    /// Build a table from precomputed percentages (counts are zero).
    pub fn from_percentages(values: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            entries: values
                .into_iter()
                .map(|(k, risk_pct)| (k, RiskEntry { risk_pct, count: 0 }))
                .collect(),
        }
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries.get(key).map(|e| e.risk_pct)
    }

    pub fn entry(&self, key: &K) -> Option<&RiskEntry> {
        self.entries.get(key)
    }

    /// `(key, risk_pct)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(k, e)| (k, e.risk_pct))
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of records across all keys.
    pub fn total_count(&self) -> usize {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Unweighted mean of the per-key percentages, 0 for an empty table.
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.values().map(|e| e.risk_pct).sum::<f64>() / self.entries.len() as f64
    }

    /// Keys whose risk is strictly above the table's mean.
    pub fn high_risk(&self) -> Vec<K> {
        let mean = self.mean();
        self.entries
            .iter()
            .filter(|(_, e)| e.risk_pct > mean)
            .map(|(k, _)| k.clone())
            .collect()
    }
}
