//! Scheduler error types

use std::time::Duration;
use thiserror::Error;

use super::{DrainReport, Lifecycle};

/// Errors raised by scheduler construction, enqueue and drain
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Enqueue or drain requested after the intake was closed
    #[error("scheduler is not accepting work (state: {0})")]
    NotAccepting(Lifecycle),

    /// The waiting caller cancelled the drain
    #[error("drain cancelled: {0}")]
    Cancelled(DrainReport),

    /// The configured drain timeout elapsed
    #[error("drain timed out after {}ms: {report}", .timeout.as_millis())]
    TimedOut {
        timeout: Duration,
        report: DrainReport,
    },

    /// The worker pool could not be created
    #[error("failed to create worker pool: {0}")]
    PoolCreation(String),
}

impl SchedulerError {
    /// Whether the drain was interrupted before every unit finished
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            SchedulerError::Cancelled(_) | SchedulerError::TimedOut { .. }
        )
    }

    /// Unit accounting carried by an interrupted drain
    pub fn report(&self) -> Option<DrainReport> {
        match self {
            SchedulerError::Cancelled(report) => Some(*report),
            SchedulerError::TimedOut { report, .. } => Some(*report),
            _ => None,
        }
    }
}
