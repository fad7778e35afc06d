//! Historical dataset loading and synthesis.
//!
//! The dataset is a CSV with header `timestamp,heart_rate,panic_attack,activity`.
//! A missing, incomplete, or malformed file is never fatal: a synthetic
//! dataset is generated in its place and written back when possible.

use crate::analysis::{Activity, RiskRecord};
use crate::error::DatasetError;
use crate::source::clamp_heart_rate;
use crate::source::simulated::reference_distribution;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::distributions::WeightedIndex;
use rand::Rng;
use std::path::Path;

/// Number of records in a synthetic dataset.
pub const SYNTHETIC_RECORD_COUNT: usize = 1000;

/// Baseline probability of a panic-attack label.
pub const BASELINE_ATTACK_PROBABILITY: f64 = 0.05;

/// Probability of a label following a trigger activity.
pub const TRIGGERED_ATTACK_PROBABILITY: f64 = 0.15;

/// Activity mix used for synthetic history. Weights sum to 1.
pub const SYNTHETIC_ACTIVITY_MIX: [(Activity, f64); 5] = [
    (Activity::SocialInteraction, 0.25),
    (Activity::LoudEnvironment, 0.20),
    (Activity::RoutineChange, 0.20),
    (Activity::ScreenTime, 0.20),
    (Activity::QuietRest, 0.15),
];

/// Columns a dataset file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["timestamp", "heart_rate", "panic_attack", "activity"];

/// Where a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetOrigin {
    Loaded,
    Synthesized,
}

/// Historical records plus their provenance.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<RiskRecord>,
    pub origin: DatasetOrigin,
}

/// First synthetic timestamp (2025-01-01 00:00:00).
pub fn synthetic_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Generate synthetic history.
///
/// Records are one minute apart. After the independent draws, a single pass in
/// timestamp order re-draws unlabeled records that follow a trigger activity
/// with the higher probability.
pub fn synthesize<R: Rng>(rng: &mut R) -> Vec<RiskRecord> {
    let heart_rate = reference_distribution();
    let activity_mix = activity_distribution();
    let epoch = synthetic_epoch();

    let mut records: Vec<RiskRecord> = (0..SYNTHETIC_RECORD_COUNT)
        .map(|i| RiskRecord {
            timestamp: epoch + Duration::minutes(i as i64),
            heart_rate: clamp_heart_rate(rng.sample(&heart_rate)),
            panic_attack: rng.gen_bool(BASELINE_ATTACK_PROBABILITY),
            activity: SYNTHETIC_ACTIVITY_MIX[rng.sample(&activity_mix)].0,
        })
        .collect();

    for i in 1..records.len() {
        if records[i - 1].activity.is_trigger() && !records[i].panic_attack {
            records[i].panic_attack = rng.gen_bool(TRIGGERED_ATTACK_PROBABILITY);
        }
    }

    records
}

fn activity_distribution() -> WeightedIndex<f64> {
    // Constant weights are positive and finite.
    match WeightedIndex::new(SYNTHETIC_ACTIVITY_MIX.iter().map(|(_, weight)| *weight)) {
        Ok(index) => index,
        Err(_) => unreachable!("synthetic activity weights are valid"),
    }
}

/// Read a dataset file, checking that every required column is present.
pub fn read_csv(path: &Path) -> Result<Vec<RiskRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.trim() == *col))
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::Schema(format!(
            "missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Write a dataset file, creating parent directories.
pub fn write_csv(path: &Path, records: &[RiskRecord]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Load the dataset at `path`, or synthesize and persist one.
pub fn load_or_synthesize<R: Rng>(path: &Path, rng: &mut R) -> Dataset {
    match read_csv(path) {
        Ok(records) if !records.is_empty() => {
            tracing::info!(path = %path.display(), records = records.len(), "Loaded historical dataset");
            return Dataset {
                records,
                origin: DatasetOrigin::Loaded,
            };
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Historical dataset is empty, regenerating");
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Historical dataset unusable, regenerating");
        }
    }

    let records = synthesize(rng);
    if let Err(e) = write_csv(path, &records) {
        tracing::warn!(path = %path.display(), error = %e, "Could not write synthetic dataset");
    }

    Dataset {
        records,
        origin: DatasetOrigin::Synthesized,
    }
}

/// Serde support for `YYYY-MM-DD HH:MM:SS` timestamps.
pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Serde support for 0/1 outcome flags.
pub(crate) mod flag_format {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*flag))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Ok(true),
            "0" | "0.0" | "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid panic_attack flag: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MAX_HEART_RATE, MIN_HEART_RATE};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_synthesize_structure() {
        let mut rng = StdRng::seed_from_u64(1);
        let records = synthesize(&mut rng);

        assert_eq!(records.len(), SYNTHETIC_RECORD_COUNT);
        assert_eq!(records[0].timestamp, synthetic_epoch());
        assert_eq!(
            records[999].timestamp,
            synthetic_epoch() + Duration::minutes(999)
        );
        assert!(records
            .iter()
            .all(|r| (MIN_HEART_RATE..=MAX_HEART_RATE).contains(&r.heart_rate)));
    }

    #[test]
    fn test_synthetic_activity_mix() {
        let mut rng = StdRng::seed_from_u64(2);
        let records: Vec<RiskRecord> = (0..10).flat_map(|_| synthesize(&mut rng)).collect();
        let n = records.len() as f64;

        for (activity, weight) in SYNTHETIC_ACTIVITY_MIX {
            let share = records.iter().filter(|r| r.activity == activity).count() as f64 / n;
            assert!(
                (share - weight).abs() < 0.03,
                "{activity}: share {share} vs weight {weight}"
            );
        }
    }

    #[test]
    fn test_trigger_raises_following_risk() {
        let mut rng = StdRng::seed_from_u64(3);
        let records: Vec<RiskRecord> = (0..20).flat_map(|_| synthesize(&mut rng)).collect();

        let (mut after_trigger, mut after_trigger_pos) = (0usize, 0usize);
        let (mut after_calm, mut after_calm_pos) = (0usize, 0usize);
        for pair in records.windows(2) {
            if pair[1].timestamp == synthetic_epoch() {
                continue;
            }
            if pair[0].activity.is_trigger() {
                after_trigger += 1;
                after_trigger_pos += pair[1].panic_attack as usize;
            } else {
                after_calm += 1;
                after_calm_pos += pair[1].panic_attack as usize;
            }
        }

        let trigger_rate = after_trigger_pos as f64 / after_trigger as f64;
        let calm_rate = after_calm_pos as f64 / after_calm as f64;
        // 0.05 + 0.95 * 0.15 = 0.1925 after a trigger, 0.05 otherwise
        assert!((trigger_rate - 0.1925).abs() < 0.03, "{trigger_rate}");
        assert!((calm_rate - 0.05).abs() < 0.02, "{calm_rate}");
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut rng = StdRng::seed_from_u64(4);
        let records = synthesize(&mut rng);

        write_csv(&path, &records).unwrap();
        let loaded = read_csv(&path).unwrap();
        assert_eq!(loaded.len(), records.len());
        assert_eq!(loaded[10].activity, records[10].activity);
        assert_eq!(loaded[10].panic_attack, records[10].panic_attack);
        assert_eq!(loaded[10].timestamp, records[10].timestamp);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("timestamp,heart_rate,panic_attack,activity"));
    }

    #[test]
    fn test_reads_pandas_style_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "timestamp,heart_rate,panic_attack,activity\n\
             2025-01-01 00:00:00,81.5,0,Screen Time\n\
             2025-01-01 00:01:00,99.0,1,Social Interaction\n",
        )
        .unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].panic_attack);
        assert_eq!(records[1].activity, Activity::SocialInteraction);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "timestamp,heart_rate\n2025-01-01 00:00:00,80\n").unwrap();

        assert!(matches!(read_csv(&path), Err(DatasetError::Schema(_))));
    }

    #[test]
    fn test_load_or_synthesize_recovers_and_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not,a,dataset\n1,2,3\n").unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let dataset = load_or_synthesize(&path, &mut rng);
        assert_eq!(dataset.origin, DatasetOrigin::Synthesized);
        assert_eq!(dataset.records.len(), SYNTHETIC_RECORD_COUNT);

        // Second load picks up the written-back file
        let reloaded = load_or_synthesize(&path, &mut rng);
        assert_eq!(reloaded.origin, DatasetOrigin::Loaded);
        assert_eq!(reloaded.records.len(), SYNTHETIC_RECORD_COUNT);
    }

    #[test]
    fn test_malformed_row_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "timestamp,heart_rate,panic_attack,activity\n\
             yesterday,fast,maybe,Skydiving\n",
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(6);
        let dataset = load_or_synthesize(&path, &mut rng);
        assert_eq!(dataset.origin, DatasetOrigin::Synthesized);
    }
}
