//! End-to-end tests for the streaming risk pipeline.

use chrono::{TimeZone, Utc};
use panic_predictor::analysis::{
    AggregateRiskAnalyzer, DatasetOrigin, DatasetSource, SYNTHETIC_RECORD_COUNT,
};
use panic_predictor::config::Config;
use panic_predictor::core::{FeatureBuilder, HistoryBuffer};
use panic_predictor::error::{ModelError, PipelineStage};
use panic_predictor::model::{RiskClassifier, Scaler};
use panic_predictor::session::{CancellationToken, RiskContext, StopReason, StreamingSession};
use panic_predictor::source::{ChannelSource, ReplaySource};
use panic_predictor::{ActivityAttributor, RiskTables};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct Identity;

impl Scaler for Identity {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(features.to_vec())
    }
}

/// Probability rises linearly from 0 at 40 bpm to 1 at 160 bpm.
struct Linear;

impl RiskClassifier for Linear {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        Ok((features[0] - 40.0) / 120.0)
    }
}

/// Always fails, as a mis-fitted model would.
struct Broken;

impl RiskClassifier for Broken {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::ShapeMismatch {
            expected: 7,
            actual: features.len(),
        })
    }
}

fn synthetic_tables(seed: u64) -> Arc<RiskTables> {
    AggregateRiskAnalyzer::new(DatasetSource::Synthetic)
        .with_seed(seed)
        .tables()
}

fn linear_context() -> Arc<RiskContext> {
    Arc::new(
        RiskContext::new(synthetic_tables(17), Arc::new(Identity), Arc::new(Linear))
            .with_sample_interval(Duration::ZERO),
    )
}

proptest! {
    #[test]
    fn test_history_keeps_last_ten_in_order(values in prop::collection::vec(40.0f64..160.0, 0..40)) {
        let mut buffer = HistoryBuffer::default();
        for v in &values {
            buffer.push(*v);
            prop_assert!(buffer.len() <= 10);
        }
        let start = values.len().saturating_sub(10);
        prop_assert_eq!(buffer.values(), values[start..].to_vec());
    }

    #[test]
    fn test_hr_change_is_difference_from_previous(values in prop::collection::vec(40.0f64..160.0, 1..30)) {
        let builder = FeatureBuilder::default();
        let mut buffer = HistoryBuffer::default();
        let now = Utc.with_ymd_and_hms(2025, 5, 5, 12, 0, 0).unwrap();

        for (i, v) in values.iter().enumerate() {
            let features = builder.build(*v, &mut buffer, now).unwrap();
            let expected = if i == 0 { 0.0 } else { v - values[i - 1] };
            prop_assert!((features.hr_change - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trend_stays_aligned(values in prop::collection::vec(40.0f64..160.0, 1..35)) {
        let mut session = StreamingSession::with_attributor(linear_context(), ActivityAttributor::seeded(4));
        let mut source = ReplaySource::new(values.clone());
        let token = CancellationToken::new();

        let summary = session
            .run(&mut source, &token, None, |update| {
                assert!(update.trend.is_aligned());
                assert!(update.trend.len() <= 10);
            })
            .unwrap();

        prop_assert_eq!(summary.iterations, values.len() as u64);
        let trend = session.trend();
        prop_assert!(trend.is_aligned());
        prop_assert_eq!(trend.len(), values.len().min(10));
    }
}

#[test]
fn test_missing_dataset_is_synthesized_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("panic_attack_data.csv");

    let analyzer = AggregateRiskAnalyzer::new(DatasetSource::File(path.clone())).with_seed(99);
    let tables = analyzer.tables();

    assert_eq!(tables.origin, DatasetOrigin::Synthesized);
    assert_eq!(tables.record_count, SYNTHETIC_RECORD_COUNT);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,heart_rate,panic_attack,activity")
    );
    assert_eq!(lines.count(), SYNTHETIC_RECORD_COUNT);
}

#[test]
fn test_risk_tables_bounded_and_complete() {
    let tables = synthetic_tables(31);
    assert!(tables
        .hourly
        .iter()
        .all(|(_, pct)| (0.0..=100.0).contains(&pct)));
    assert!(tables
        .activity
        .iter()
        .all(|(_, pct)| (0.0..=100.0).contains(&pct)));
    assert_eq!(tables.hourly.total_count(), tables.record_count);
    assert_eq!(tables.activity.total_count(), tables.record_count);
}

#[test]
fn test_predict_with_reference_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dataset_path: dir.path().join("data.csv"),
        data_path: dir.path().to_path_buf(),
        export_path: dir.path().join("exports"),
        ..Config::default()
    };
    let analyzer = AggregateRiskAnalyzer::new(DatasetSource::File(config.dataset_path.clone()))
        .with_seed(2);
    let context = Arc::new(RiskContext::from_config(&config, &analyzer).unwrap());

    let mut session = StreamingSession::with_attributor(context, ActivityAttributor::seeded(8));
    let calm = session.evaluate(62.0).unwrap();
    assert!((0.0..=1.0).contains(&calm.probability));
    assert_eq!(calm.is_risk, calm.probability >= 0.3);
    assert_eq!(calm.attributed_activity.is_some(), calm.is_risk);
}

#[test]
fn test_classifier_failure_is_not_substituted() {
    let context = Arc::new(RiskContext::new(
        synthetic_tables(3),
        Arc::new(Identity),
        Arc::new(Broken),
    ));
    let mut session = StreamingSession::with_attributor(context, ActivityAttributor::seeded(1));
    let err = session.evaluate(90.0).unwrap_err();
    assert_eq!(err.stage(), PipelineStage::Classify);
}

#[test]
fn test_channel_fed_session_until_cancelled() {
    let mut session = StreamingSession::with_attributor(linear_context(), ActivityAttributor::seeded(6));
    let (sender, mut source) = ChannelSource::pair();
    let token = CancellationToken::new();
    let canceller = token.clone();

    let producer = thread::spawn(move || {
        for hr in [70.0, 150.0, 155.0] {
            sender.push(hr);
        }
        sender
    });
    let sender = producer.join().unwrap();

    let mut seen = Vec::new();
    let summary = session
        .run(&mut source, &token, None, |update| {
            seen.push(update.reading.value);
            if seen.len() == 3 {
                canceller.cancel();
            }
        })
        .unwrap();
    drop(sender);

    assert_eq!(seen, vec![70.0, 150.0, 155.0]);
    assert_eq!(summary.stop_reason, StopReason::Cancelled);
    assert_eq!(summary.risk_flags, 2);
}

#[test]
fn test_cancel_while_sensor_is_silent() {
    let mut session = StreamingSession::with_attributor(linear_context(), ActivityAttributor::seeded(7));
    let (sender, mut source) = ChannelSource::pair();
    let token = CancellationToken::new();
    let run_token = token.clone();
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);

    let runner = thread::spawn(move || {
        let summary = session.run(&mut source, &run_token, None, |_| {});
        let _ = done_tx.send(summary.map(|s| (s.iterations, s.stop_reason)));
    });

    thread::sleep(Duration::from_millis(100));
    token.cancel();

    let result = done_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("run did not return after cancellation");
    assert_eq!(result.unwrap(), (0, StopReason::Cancelled));
    runner.join().unwrap();
    drop(sender);
}

#[test]
fn test_sessions_hold_independent_history() {
    let context = linear_context();
    let mut first = StreamingSession::with_attributor(context.clone(), ActivityAttributor::seeded(1));
    let mut second = StreamingSession::with_attributor(context, ActivityAttributor::seeded(2));

    first.evaluate(70.0).unwrap();
    first.evaluate(72.0).unwrap();
    second.evaluate(100.0).unwrap();

    assert_eq!(first.history().values(), vec![70.0, 72.0]);
    assert_eq!(second.history().values(), vec![100.0]);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_stream_update_serializes_for_consumers() {
    let mut session = StreamingSession::with_attributor(linear_context(), ActivityAttributor::seeded(5));
    let mut source = ReplaySource::new([130.0]);
    let token = CancellationToken::new();

    let mut json = String::new();
    session
        .run(&mut source, &token, Some(1), |update| {
            json = serde_json::to_string(update).unwrap();
        })
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["producer"], "panic-predictor");
    assert_eq!(value["sequence"], 1);
    assert_eq!(value["decision"]["is_risk"], true);
    assert_eq!(value["trend"]["heart_rate"][0], 130.0);
    assert!(value["decision"]["attributed_activity"].is_string());
}
