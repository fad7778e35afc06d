//! Monitoring sessions.
//!
//! This module contains:
//! - The immutable [`RiskContext`] built once at startup
//! - [`StreamingSession`], which owns per-session history and trend state
//! - [`CancellationToken`] for stopping the continuous loop

pub mod cancel;
pub mod context;
pub mod stream;

pub use cancel::CancellationToken;
pub use context::{ContextError, RiskContext};
pub use stream::{RunSummary, StopReason, StreamingSession};
