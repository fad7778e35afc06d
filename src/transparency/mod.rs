//! Transparency module for the panic predictor.
//!
//! Tracks and exposes what the predictor has evaluated, so a user can audit
//! how often it ran and what it flagged.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SessionLog, SessionStats,
    SharedSessionLog,
};
