//! Test execution scheduling
//!
//! A scheduler accepts work units in discovery order and exposes a single
//! completion barrier. [`SerialExecutor`] runs every unit inline at enqueue
//! time; [`ConcurrentExecutor`] dispatches units onto a fixed or unbounded
//! worker pool. [`select`] picks one from a suite's [`SchedulerConfig`].
//!
//! [`SchedulerConfig`]: crate::models::SchedulerConfig

mod concurrent;
mod error;
mod selector;
mod serial;
mod unit;

pub use concurrent::{ConcurrentExecutor, PoolSize};
pub use error::SchedulerError;
pub use selector::select;
pub use serial::SerialExecutor;
pub use unit::{OutcomeHandle, UnitOutcome, WorkUnit};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a scheduler instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Configuration bound, nothing enqueued yet
    Created,
    /// At least one unit enqueued
    Accepting,
    /// Completion wait in progress; intake closed
    Draining,
    /// All units finished or abandoned, pool released
    Terminated,
}

impl Lifecycle {
    /// Whether `enqueue` is valid in this state
    pub fn accepts_work(&self) -> bool {
        matches!(self, Lifecycle::Created | Lifecycle::Accepting)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Created => write!(f, "created"),
            Lifecycle::Accepting => write!(f, "accepting"),
            Lifecycle::Draining => write!(f, "draining"),
            Lifecycle::Terminated => write!(f, "terminated"),
        }
    }
}

/// Which implementation a scheduler is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerKind {
    Serial,
    Concurrent(PoolSize),
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerKind::Serial => write!(f, "serial"),
            SchedulerKind::Concurrent(pool) => write!(f, "concurrent ({pool})"),
        }
    }
}

/// Unit accounting at the end of a drain.
///
/// `completed + abandoned == enqueued` holds for every report handed out,
/// whether the drain finished normally or was interrupted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub enqueued: usize,
    pub completed: usize,
    pub abandoned: usize,
}

impl DrainReport {
    pub fn is_balanced(&self) -> bool {
        self.completed + self.abandoned == self.enqueued
    }
}

impl fmt::Display for DrainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed, {} abandoned",
            self.completed, self.enqueued, self.abandoned
        )
    }
}

/// Dispatches work units and provides the completion barrier.
///
/// `enqueue` is called from the driver only, once per discovered test, in
/// discovery order. One of the `await_completion*` methods is called exactly
/// once afterwards; later calls to either method fail with
/// [`SchedulerError::NotAccepting`].
#[async_trait]
pub trait Scheduler: Send {
    /// Submit a unit for execution
    async fn enqueue(&mut self, unit: WorkUnit) -> Result<(), SchedulerError>;

    /// Wait for every enqueued unit, with an external cancellation signal.
    ///
    /// Firing `cancel` while units are outstanding ends the wait with
    /// [`SchedulerError::Cancelled`].
    async fn await_completion_until(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, SchedulerError>;

    /// Wait for every enqueued unit
    async fn await_completion(&mut self) -> Result<DrainReport, SchedulerError> {
        let never = CancellationToken::new();
        self.await_completion_until(&never).await
    }

    fn lifecycle(&self) -> Lifecycle;

    fn kind(&self) -> SchedulerKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_accepts_work() {
        assert!(Lifecycle::Created.accepts_work());
        assert!(Lifecycle::Accepting.accepts_work());
        assert!(!Lifecycle::Draining.accepts_work());
        assert!(!Lifecycle::Terminated.accepts_work());
    }

    #[test]
    fn test_drain_report_balance() {
        let report = DrainReport {
            enqueued: 5,
            completed: 3,
            abandoned: 2,
        };
        assert!(report.is_balanced());
        assert_eq!(report.to_string(), "3/5 completed, 2 abandoned");

        let lost = DrainReport {
            enqueued: 5,
            completed: 3,
            abandoned: 1,
        };
        assert!(!lost.is_balanced());
    }
}
