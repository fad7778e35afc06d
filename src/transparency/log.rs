//! Session statistics log.
//!
//! Counts what the predictor has evaluated and flagged. Only counters are
//! kept; no heart-rate values are persisted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current and previous sessions.
#[derive(Debug)]
pub struct SessionLog {
    /// Readings run through the continuous loop
    readings_processed: AtomicU64,
    /// Single-shot evaluations
    manual_evaluations: AtomicU64,
    /// Evaluations at or above the risk threshold
    risk_flags: AtomicU64,
    /// Evaluations aborted by a pipeline error
    failed_evaluations: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            readings_processed: AtomicU64::new(0),
            manual_evaluations: AtomicU64::new(0),
            risk_flags: AtomicU64::new(0),
            failed_evaluations: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that resumes from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "Could not load previous session stats");
        }

        log
    }

    pub fn record_reading(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_manual_evaluation(&self) {
        self.manual_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_risk_flag(&self) {
        self.risk_flags.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            readings_processed: self.readings_processed.load(Ordering::Relaxed),
            manual_evaluations: self.manual_evaluations.load(Ordering::Relaxed),
            risk_flags: self.risk_flags.load(Ordering::Relaxed),
            failed_evaluations: self.failed_evaluations.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Readings processed: {}\n\
             - Manual evaluations: {}\n\
             - Risk flags raised: {}\n\
             - Failed evaluations: {}\n\
             - Session duration: {} seconds",
            stats.readings_processed,
            stats.manual_evaluations,
            stats.risk_flags,
            stats.failed_evaluations,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                readings_processed: stats.readings_processed,
                manual_evaluations: stats.manual_evaluations,
                risk_flags: stats.risk_flags,
                failed_evaluations: stats.failed_evaluations,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.readings_processed
                    .store(persisted.readings_processed, Ordering::Relaxed);
                self.manual_evaluations
                    .store(persisted.manual_evaluations, Ordering::Relaxed);
                self.risk_flags
                    .store(persisted.risk_flags, Ordering::Relaxed);
                self.failed_evaluations
                    .store(persisted.failed_evaluations, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.readings_processed.store(0, Ordering::Relaxed);
        self.manual_evaluations.store(0, Ordering::Relaxed);
        self.risk_flags.store(0, Ordering::Relaxed);
        self.failed_evaluations.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub readings_processed: u64,
    pub manual_evaluations: u64,
    pub risk_flags: u64,
    pub failed_evaluations: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    readings_processed: u64,
    manual_evaluations: u64,
    risk_flags: u64,
    failed_evaluations: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}
