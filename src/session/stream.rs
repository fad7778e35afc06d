//! Streaming session: single-shot and continuous evaluation.

use crate::analysis::{Activity, ActivityAttributor};
use crate::core::decision::{Decision, StreamUpdate, PRODUCER_NAME};
use crate::core::features::{Clock, FeatureBuilder, FeatureVector, SystemClock};
use crate::core::history::{HistoryBuffer, TrendPoint, TrendSnapshot, TrendState};
use crate::error::{PipelineError, SourceError};
use crate::session::cancel::CancellationToken;
use crate::session::context::RiskContext;
use crate::source::{Reading, ReadingSource};
use crate::transparency::{create_shared_log, SharedSessionLog};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Why a continuous run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    IterationLimit,
    SourceExhausted,
}

/// Totals for one continuous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub risk_flags: u64,
    pub stop_reason: StopReason,
}

/// One monitoring session.
///
/// Owns its history buffer and trend; nothing here is shared with other
/// sessions except the read-only [`RiskContext`]. Single-shot and continuous
/// evaluations feed the same history buffer, but only continuous evaluation
/// touches the trend.
pub struct StreamingSession<R: Rng = StdRng> {
    id: Uuid,
    context: Arc<RiskContext>,
    history: HistoryBuffer,
    trend: TrendState,
    features: FeatureBuilder,
    attributor: ActivityAttributor<R>,
    clock: Box<dyn Clock>,
    log: SharedSessionLog,
    sequence: u64,
    last_manual: Option<Decision>,
}

impl StreamingSession<StdRng> {
    pub fn new(context: Arc<RiskContext>) -> Self {
        Self::with_attributor(context, ActivityAttributor::new())
    }
}

impl<R: Rng> StreamingSession<R> {
    pub fn with_attributor(context: Arc<RiskContext>, attributor: ActivityAttributor<R>) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: HistoryBuffer::new(context.history_capacity()),
            trend: TrendState::new(context.trend_capacity()),
            features: FeatureBuilder::new(context.timezone()),
            attributor,
            clock: Box::new(SystemClock),
            log: create_shared_log(),
            sequence: 0,
            last_manual: None,
            context,
        }
    }

    /// Replace the clock used by single-shot evaluation.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Record counters into a shared log.
    pub fn with_log(mut self, log: SharedSessionLog) -> Self {
        self.log = log;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn trend(&self) -> TrendSnapshot {
        self.trend.snapshot()
    }

    pub fn context(&self) -> &RiskContext {
        &self.context
    }

    /// Most recent single-shot decision.
    pub fn last_manual(&self) -> Option<Decision> {
        self.last_manual
    }

    /// Single-shot evaluation of a manually entered heart rate.
    pub fn evaluate(&mut self, heart_rate: f64) -> Result<Decision, PipelineError> {
        let now = self.clock.now();
        self.evaluate_at(heart_rate, now)
    }

    /// Single-shot evaluation at an explicit time. Leaves the trend untouched.
    pub fn evaluate_at(
        &mut self,
        heart_rate: f64,
        now: DateTime<Utc>,
    ) -> Result<Decision, PipelineError> {
        let reading = Reading::new(heart_rate, now);
        let (_, _, decision) = self.assess(reading.value, reading.timestamp)?;
        self.log.record_manual_evaluation();
        self.last_manual = Some(decision);
        Ok(decision)
    }

    /// One continuous-mode iteration for an acquired reading, without waiting.
    pub fn step(&mut self, reading: Reading) -> Result<StreamUpdate, PipelineError> {
        let (features, sampled, decision) = self.assess(reading.value, reading.timestamp)?;

        let hrv = self.trend.hrv_with(reading.value);
        self.trend.push(TrendPoint {
            timestamp: reading.timestamp,
            heart_rate: reading.value,
            probability_pct: decision.probability_pct(),
            hrv,
            activity: sampled,
        });

        self.sequence += 1;
        self.log.record_reading();

        tracing::debug!(
            session = %self.id,
            sequence = self.sequence,
            heart_rate = reading.value,
            probability = decision.probability,
            is_risk = decision.is_risk,
            hrv,
            "Processed reading"
        );

        Ok(StreamUpdate {
            producer: PRODUCER_NAME.to_string(),
            session_id: self.id,
            sequence: self.sequence,
            reading,
            features,
            decision,
            sampled_activity: sampled,
            hrv,
            trend: self.trend.snapshot(),
        })
    }

    /// Continuous mode: acquire, evaluate, emit, wait; repeat until
    /// cancelled, `max_iterations` is reached, or the source runs dry.
    ///
    /// Cancellation is checked before acquiring, while the source waits for
    /// a reading, again before classifying, and during the wait between
    /// readings. Pipeline errors end the run and
    /// are returned.
    pub fn run<S, F>(
        &mut self,
        source: &mut S,
        token: &CancellationToken,
        max_iterations: Option<u64>,
        mut on_update: F,
    ) -> Result<RunSummary, PipelineError>
    where
        S: ReadingSource + ?Sized,
        F: FnMut(&StreamUpdate),
    {
        let interval = self.context.sample_interval();
        let mut iterations = 0u64;
        let mut risk_flags = 0u64;

        tracing::info!(session = %self.id, interval_secs = interval.as_secs_f64(), "Starting continuous monitoring");

        let stop_reason = loop {
            if token.is_cancelled() {
                break StopReason::Cancelled;
            }
            if max_iterations.is_some_and(|max| iterations >= max) {
                break StopReason::IterationLimit;
            }

            let reading = match source.next_reading(token) {
                Ok(reading) => reading,
                Err(SourceError::Exhausted) => break StopReason::SourceExhausted,
                Err(SourceError::Cancelled) => break StopReason::Cancelled,
                Err(e) => {
                    self.log.record_failure();
                    return Err(e.into());
                }
            };

            if token.is_cancelled() {
                break StopReason::Cancelled;
            }

            let update = self.step(reading)?;
            iterations += 1;
            if update.decision.is_risk {
                risk_flags += 1;
            }
            on_update(&update);

            if max_iterations.is_some_and(|max| iterations >= max) {
                break StopReason::IterationLimit;
            }
            if token.wait_timeout(interval) {
                break StopReason::Cancelled;
            }
        };

        tracing::info!(
            session = %self.id,
            iterations,
            risk_flags,
            stop_reason = ?stop_reason,
            "Continuous monitoring stopped"
        );

        Ok(RunSummary {
            iterations,
            risk_flags,
            stop_reason,
        })
    }

    /// Feature build, attribution, classification, threshold.
    fn assess(
        &mut self,
        heart_rate: f64,
        now: DateTime<Utc>,
    ) -> Result<(FeatureVector, Activity, Decision), PipelineError> {
        let result = self.try_assess(heart_rate, now);
        match &result {
            Ok((_, _, decision)) if decision.is_risk => self.log.record_risk_flag(),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(session = %self.id, stage = ?e.stage(), error = %e, "Evaluation failed");
                self.log.record_failure();
            }
        }
        result
    }

    fn try_assess(
        &mut self,
        heart_rate: f64,
        now: DateTime<Utc>,
    ) -> Result<(FeatureVector, Activity, Decision), PipelineError> {
        let features = self.features.build(heart_rate, &mut self.history, now)?;
        let sampled = self.attributor.sample(&self.context.tables().activity)?;
        let probability = self.context.classify(&features)?;
        let decision = Decision::from_probability(probability, self.context.threshold(), sampled);
        Ok((features, sampled, decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AggregateRiskAnalyzer, DatasetSource};
    use crate::core::features::FixedClock;
    use crate::error::ModelError;
    use crate::model::{RiskClassifier, Scaler};
    use crate::source::ReplaySource;
    use chrono::TimeZone;
    use std::time::Duration;

    struct Identity;

    impl Scaler for Identity {
        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(features.to_vec())
        }
    }

    /// Probability equal to (heart_rate - 40) / 120.
    struct Linear;

    impl RiskClassifier for Linear {
        fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
            Ok((features[0] - 40.0) / 120.0)
        }
    }

    fn context(interval: Duration) -> Arc<RiskContext> {
        let tables = AggregateRiskAnalyzer::new(DatasetSource::Synthetic)
            .with_seed(5)
            .tables();
        Arc::new(
            RiskContext::new(tables, Arc::new(Identity), Arc::new(Linear))
                .with_sample_interval(interval),
        )
    }

    fn session() -> StreamingSession<StdRng> {
        StreamingSession::with_attributor(context(Duration::ZERO), ActivityAttributor::seeded(9))
    }

    #[test]
    fn test_manual_evaluation_skips_trend() {
        let mut session = session();
        // (76 - 40) / 120 = 0.3 exactly, inclusive threshold
        let decision = session.evaluate(76.0).unwrap();
        assert!(decision.is_risk);
        assert!(decision.attributed_activity.is_some());
        assert_eq!(session.history().len(), 1);
        assert!(session.trend().is_empty());
        assert_eq!(session.last_manual(), Some(decision));
    }

    #[test]
    fn test_manual_safe_has_no_cause() {
        let mut session = session();
        let decision = session.evaluate(50.0).unwrap();
        assert!(!decision.is_risk);
        assert_eq!(decision.likely_cause(), "None");
    }

    #[test]
    fn test_manual_uses_injected_clock() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 21, 45, 0).unwrap();
        let mut session = session().with_clock(FixedClock(at));
        session.evaluate(80.0).unwrap();
        let update = session.step(Reading::new(82.0, at)).unwrap();
        assert_eq!(update.features.hour, 21);
        assert_eq!(update.features.minute, 45);
        assert!((update.features.hr_change - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_updates_trend() {
        let mut session = session();
        let first = session.step(Reading::now(70.0)).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.hrv, 0.0);

        let second = session.step(Reading::now(80.0)).unwrap();
        assert!((second.hrv - 5.0).abs() < 1e-9);
        assert_eq!(second.trend.len(), 2);
        assert!(second.trend.is_aligned());
        assert_eq!(second.trend.probability_pct[1], second.decision.probability_pct());
    }

    #[test]
    fn test_run_stops_at_iteration_limit() {
        let mut session = session();
        let mut source = ReplaySource::new((0..30).map(|i| 60.0 + i as f64));
        let token = CancellationToken::new();
        let mut seen = 0;

        let summary = session
            .run(&mut source, &token, Some(15), |update| {
                seen += 1;
                assert!(update.trend.len() <= 10);
                assert!(update.trend.is_aligned());
            })
            .unwrap();

        assert_eq!(summary.iterations, 15);
        assert_eq!(summary.stop_reason, StopReason::IterationLimit);
        assert_eq!(seen, 15);
        assert_eq!(session.trend().len(), 10);
    }

    #[test]
    fn test_run_ends_when_source_exhausted() {
        let mut session = session();
        let mut source = ReplaySource::new([100.0, 110.0, 120.0]);
        let token = CancellationToken::new();

        let summary = session.run(&mut source, &token, None, |_| {}).unwrap();
        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.risk_flags, 3);
        assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    }

    #[test]
    fn test_cancelled_before_start_classifies_nothing() {
        let mut session = session();
        let mut source = ReplaySource::new([80.0]);
        let token = CancellationToken::new();
        token.cancel();

        let summary = session.run(&mut source, &token, None, |_| {}).unwrap();
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_cancel_from_callback_interrupts_wait() {
        let mut session =
            StreamingSession::with_attributor(context(Duration::from_secs(60)), ActivityAttributor::seeded(1));
        let mut source = ReplaySource::new([80.0, 81.0, 82.0]);
        let token = CancellationToken::new();
        let canceller = token.clone();

        let started = std::time::Instant::now();
        let summary = session
            .run(&mut source, &token, None, |_| canceller.cancel())
            .unwrap();

        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Fails for heart rates above 150 bpm.
    struct FailsWhenHigh;

    impl RiskClassifier for FailsWhenHigh {
        fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
            if features[0] > 150.0 {
                return Err(ModelError::InvalidProbability(f64::NAN));
            }
            Ok(0.1)
        }
    }

    #[test]
    fn test_failed_classification_still_enters_history() {
        let tables = AggregateRiskAnalyzer::new(DatasetSource::Synthetic)
            .with_seed(5)
            .tables();
        let context = Arc::new(RiskContext::new(
            tables,
            Arc::new(Identity),
            Arc::new(FailsWhenHigh),
        ));
        let mut session = StreamingSession::with_attributor(context, ActivityAttributor::seeded(2));

        session.evaluate(70.0).unwrap();
        let err = session.evaluate(155.0).unwrap_err();
        assert_eq!(err.stage(), crate::error::PipelineStage::Classify);
        assert_eq!(session.history().values(), vec![70.0, 155.0]);

        // The failed reading is the previous value for the next one
        let update = session.step(Reading::now(80.0)).unwrap();
        assert!((update.features.hr_change - (80.0 - 155.0)).abs() < 1e-9);
        assert!((update.features.hr_rolling_mean - 305.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_reading_fails_feature_stage() {
        let mut session = session();
        let err = session.step(Reading::now(f64::NAN)).unwrap_err();
        assert_eq!(err.stage(), crate::error::PipelineStage::FeatureBuild);
        assert!(session.trend().is_empty());
    }
}
