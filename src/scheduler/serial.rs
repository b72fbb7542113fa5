//! Serial test execution
//!
//! Runs every unit inline, in enqueue order.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{DrainReport, Lifecycle, Scheduler, SchedulerError, SchedulerKind, WorkUnit};
use crate::utils::Timer;

/// Scheduler that executes each unit at enqueue time
#[derive(Debug)]
pub struct SerialExecutor {
    lifecycle: Lifecycle,
    executed: usize,
}

impl SerialExecutor {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Created,
            executed: 0,
        }
    }

    /// Number of units run so far
    pub fn executed(&self) -> usize {
        self.executed
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for SerialExecutor {
    async fn enqueue(&mut self, unit: WorkUnit) -> Result<(), SchedulerError> {
        if !self.lifecycle.accepts_work() {
            error!(
                "Rejected unit '{}': serial executor is {}",
                unit.name(),
                self.lifecycle
            );
            return Err(SchedulerError::NotAccepting(self.lifecycle));
        }
        self.lifecycle = Lifecycle::Accepting;

        let (name, task) = unit.into_parts();
        let timer = Timer::start(name);
        task.await;
        self.executed += 1;
        timer.finish();

        Ok(())
    }

    async fn await_completion_until(
        &mut self,
        _cancel: &CancellationToken,
    ) -> Result<DrainReport, SchedulerError> {
        if !self.lifecycle.accepts_work() {
            error!("Drain requested twice: serial executor is {}", self.lifecycle);
            return Err(SchedulerError::NotAccepting(self.lifecycle));
        }

        // Nothing is ever outstanding, so there is nothing to cancel.
        self.lifecycle = Lifecycle::Terminated;
        let report = DrainReport {
            enqueued: self.executed,
            completed: self.executed,
            abandoned: 0,
        };
        info!("Serial executor drained: {}", report);
        debug!("Serial executor terminated");

        Ok(report)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_units_run_in_enqueue_order() {
        let mut executor = SerialExecutor::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let busy = Arc::new(AtomicBool::new(false));

        for i in 0..10 {
            let seen = order.clone();
            let busy = busy.clone();
            let unit = WorkUnit::new(format!("unit-{i}"), async move {
                assert!(!busy.swap(true, Ordering::SeqCst), "units overlapped");
                tokio::task::yield_now().await;
                seen.lock().unwrap().push(i);
                busy.store(false, Ordering::SeqCst);
            });
            executor.enqueue(unit).await.unwrap();

            // Each unit has finished by the time enqueue returns.
            assert_eq!(order.lock().unwrap().len(), i + 1);
        }

        let report = executor.await_completion().await.unwrap();
        assert_eq!(report.enqueued, 10);
        assert_eq!(report.completed, 10);
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_drain_returns_immediately() {
        let mut executor = SerialExecutor::new();
        assert_eq!(executor.lifecycle(), Lifecycle::Created);

        let report = executor.await_completion().await.unwrap();
        assert_eq!(report, DrainReport::default());
        assert_eq!(executor.lifecycle(), Lifecycle::Terminated);
    }

    #[tokio::test]
    async fn test_enqueue_after_drain_is_rejected() {
        let mut executor = SerialExecutor::new();
        executor.enqueue(WorkUnit::new("first", async {})).await.unwrap();
        executor.await_completion().await.unwrap();

        let err = executor
            .enqueue(WorkUnit::new("late", async {}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::NotAccepting(Lifecycle::Terminated)
        ));
        assert!(executor.await_completion().await.is_err());
        assert_eq!(executor.executed(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "test body failed")]
    async fn test_panic_propagates_to_enqueue_caller() {
        let mut executor = SerialExecutor::new();
        let unit = WorkUnit::new("panicky", async {
            panic!("test body failed");
        });
        let _ = executor.enqueue(unit).await;
    }

    #[test]
    fn test_drive_from_sync_context() {
        let mut executor = SerialExecutor::default();
        let report = tokio_test::block_on(async {
            executor
                .enqueue(WorkUnit::new("sync", async {}))
                .await
                .unwrap();
            executor.await_completion().await.unwrap()
        });
        assert_eq!(report.completed, 1);
        assert_eq!(executor.kind(), SchedulerKind::Serial);
    }
}
