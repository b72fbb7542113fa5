//! Suite execution runner
//!
//! Turns each discovered test into a work unit, hands the units to the
//! scheduler the suite asked for, and collects every outcome once the
//! scheduler has drained.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::suite::TestSuite;
use crate::models::{ExecutionMode, SchedulerConfig, SuiteSummary, TestResult, TestStatus};
use crate::scheduler::{self, OutcomeHandle, UnitOutcome, WorkUnit};
use crate::utils::Timer;

/// Runs a test suite through the selected scheduler
pub struct SuiteRunner {
    suite: TestSuite,
    override_config: Option<SchedulerConfig>,
    skip: HashSet<String>,
    cancel: CancellationToken,
}

impl SuiteRunner {
    pub fn new(suite: TestSuite) -> Self {
        Self {
            suite,
            override_config: None,
            skip: HashSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use this configuration instead of the suite's own preference
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.override_config = Some(config);
        self
    }

    /// Record these tests as skipped instead of running them
    pub fn with_skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(names.into_iter().map(Into::into));
        self
    }

    /// Cancelling this token interrupts the completion wait
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    /// Configuration in effect; `None` means the serial default
    pub fn config(&self) -> Option<&SchedulerConfig> {
        self.override_config.as_ref().or(self.suite.config())
    }

    fn mode(&self) -> ExecutionMode {
        self.config().map(|c| c.mode).unwrap_or_default()
    }

    /// Run every test once
    pub async fn run(&self) -> Result<SuiteSummary> {
        self.run_round(1).await
    }

    /// Run the suite `num_rounds` times, each with a fresh scheduler.
    ///
    /// Stops early after an interrupted round. Once the cancellation token
    /// fires, a round abandons every test it has not yet dispatched.
    pub async fn run_rounds(&self, num_rounds: u32) -> Result<Vec<SuiteSummary>> {
        info!("Running {} rounds of {}", num_rounds, self.suite.name());

        let mut summaries = Vec::new();

        for round in 1..=num_rounds {
            info!("=== Round {}/{} ===", round, num_rounds);

            let summary = self.run_round(round).await?;
            let interrupted = summary.interruption.is_some();

            info!(
                "Round {} completed: {}/{} passed ({:.1}%)",
                round,
                summary.passed,
                summary.total,
                summary.pass_rate()
            );

            summaries.push(summary);
            if interrupted {
                warn!("Stopping after round {}: drain was interrupted", round);
                break;
            }
        }

        Ok(summaries)
    }

    async fn run_round(&self, round: u32) -> Result<SuiteSummary> {
        let mode = self.mode();
        info!(
            "Starting {} ({} tests, {})",
            self.suite.name(),
            self.suite.len(),
            self.config().map(ToString::to_string).unwrap_or_else(|| mode.to_string())
        );

        let mut scheduler = scheduler::select(self.config())
            .with_context(|| format!("Failed to create scheduler for {}", self.suite.name()))?;

        let started_at = Utc::now();
        let wall_clock = Timer::start(self.suite.name());

        let mut results = Vec::new();
        let mut pending: Vec<(usize, OutcomeHandle<TestResult>)> = Vec::new();

        for (index, method) in self.suite.methods().iter().enumerate() {
            if self.skip.contains(method.name()) {
                results.push(TestResult::skip(index, method.name(), "Skipped by configuration"));
                continue;
            }
            if self.cancel.is_cancelled() {
                results.push(TestResult::abandoned(index, method.name()));
                continue;
            }

            let fixtures = self.suite.fixtures().clone();
            let method = method.clone();
            let (unit, handle) = WorkUnit::reporting(method.name().to_string(), async move {
                let timer = Timer::start(method.name());
                let (status, message) = fixtures.invoke(&method).await;
                let mut result = TestResult::new(index, method.name(), status, timer.elapsed_ms());
                result.message = message;
                result
            });

            // A serial scheduler runs the unit inside enqueue; dropping the
            // enqueue future abandons it.
            let enqueued = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                enqueued = scheduler.enqueue(unit) => Some(enqueued),
            };
            match enqueued {
                Some(enqueued) => {
                    enqueued.with_context(|| format!("Failed to enqueue {}", handle.name()))?
                }
                None => warn!("Cancelled while dispatching {}", handle.name()),
            }
            pending.push((index, handle));
        }

        let mut interruption = match scheduler.await_completion_until(&self.cancel).await {
            Ok(report) => {
                info!("All units finished: {}", report);
                None
            }
            Err(e) if e.is_interruption() => {
                warn!("{}: {}", self.suite.name(), e);
                Some(e.to_string())
            }
            Err(e) => return Err(e).context("Scheduler failed while draining"),
        };

        for (index, handle) in pending {
            let name = handle.name().to_string();
            let result = match handle.outcome().await {
                UnitOutcome::Finished(result) => result,
                UnitOutcome::Panicked(message) => {
                    TestResult::error(index, name, 0, format!("panicked: {message}"))
                }
                UnitOutcome::Abandoned => TestResult::abandoned(index, name),
            };
            results.push(result);
        }

        if interruption.is_none()
            && self.cancel.is_cancelled()
            && results.iter().any(|r| r.status == TestStatus::Abandoned)
        {
            warn!("{}: cancelled before every test finished", self.suite.name());
            interruption = Some("run cancelled before every test finished".to_string());
        }

        let mut summary = SuiteSummary::new(round, self.suite.name(), mode, results)
            .with_wall_clock(started_at, wall_clock.elapsed_ms());
        if let Some(reason) = interruption {
            summary = summary.with_interruption(reason);
        }

        info!(
            "{} completed in {}ms - Pass: {}/{} ({:.1}%)",
            self.suite.name(),
            summary.wall_clock_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn mixed_suite() -> TestSuite {
        TestSuite::new("mixed")
            .test("passes", || async { Ok(()) })
            .test("fails", || async { bail!("expected true") })
            .test("skipped", || async { Ok(()) })
            .test("panics", || async {
                if true {
                    panic!("index out of bounds");
                }
                Ok(())
            })
            .test("also-passes", || async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            })
    }

    fn assert_mixed(summary: &SuiteSummary) {
        let statuses: Vec<_> = summary.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [
                TestStatus::Pass,
                TestStatus::Fail,
                TestStatus::Skip,
                TestStatus::Error,
                TestStatus::Pass,
            ]
        );
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(
            summary.results[3].message.as_deref(),
            Some("panicked: index out of bounds")
        );
        assert!(summary.interruption.is_none());
    }

    #[tokio::test]
    async fn test_serial_run_reports_every_outcome() {
        let runner = SuiteRunner::new(mixed_suite()).with_skip(["skipped"]);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.mode, ExecutionMode::Serial);
        assert_mixed(&summary);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_run_reports_every_outcome() {
        let suite = mixed_suite().with_config(SchedulerConfig::parallel().with_workers(2));
        let runner = SuiteRunner::new(suite).with_skip(vec!["skipped".to_string()]);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.mode, ExecutionMode::Parallel);
        assert_mixed(&summary);
    }

    #[tokio::test]
    async fn test_serial_runs_in_discovery_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut suite = TestSuite::new("ordered");
        for i in 0..5 {
            let order = order.clone();
            suite = suite.test(format!("t{i}"), move || {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(i);
                    Ok(())
                }
            });
        }

        SuiteRunner::new(suite).run().await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_override_config_wins() {
        let suite = TestSuite::new("override").with_config(SchedulerConfig::serial());
        let runner = SuiteRunner::new(suite).with_config(SchedulerConfig::parallel());
        assert!(runner.config().unwrap().is_parallel());

        let summary = runner.run().await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mode, ExecutionMode::Parallel);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_run_marks_abandoned_tests() {
        let suite = TestSuite::new("hangs")
            .with_config(SchedulerConfig::parallel().with_workers(1))
            .test("quick", || async { Ok(()) })
            .test("stuck", || async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .test("queued", || async { Ok(()) });

        let cancel = CancellationToken::new();
        let runner = SuiteRunner::new(suite).with_cancellation(cancel.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let summary = runner.run().await.unwrap();
        assert!(summary.interruption.is_some());
        assert!(!summary.is_success());
        assert_eq!(summary.results[0].status, TestStatus::Pass);
        assert_eq!(summary.results[1].status, TestStatus::Abandoned);
        assert_eq!(summary.results[2].status, TestStatus::Abandoned);
    }

    #[tokio::test]
    async fn test_run_rounds_uses_fresh_scheduler() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let suite = TestSuite::new("rounds")
            .with_config(SchedulerConfig::parallel())
            .test("counted", move || {
                let r = r.clone();
                async move {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });

        let summaries = SuiteRunner::new(suite).run_rounds(3).await.unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].round, 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_serial_run_stops_dispatching() {
        let suite = TestSuite::new("serial-hang")
            .test("quick", || async { Ok(()) })
            .test("stuck", || async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .test("never-started", || async { Ok(()) });

        let cancel = CancellationToken::new();
        let runner = SuiteRunner::new(suite).with_cancellation(cancel.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let summaries = runner.run_rounds(3).await.unwrap();
        assert_eq!(summaries.len(), 1);

        let summary = &summaries[0];
        assert_eq!(summary.mode, ExecutionMode::Serial);
        assert!(summary.interruption.is_some());
        assert!(!summary.is_success());
        let statuses: Vec<_> = summary.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [TestStatus::Pass, TestStatus::Abandoned, TestStatus::Abandoned]
        );
    }

    #[tokio::test]
    async fn test_precancelled_rounds_run_nothing() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let suite = TestSuite::new("precancelled").test("counted", move || {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summaries = SuiteRunner::new(suite)
            .with_cancellation(cancel)
            .run_rounds(3)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(summaries[0].abandoned, 1);
        assert!(summaries[0].interruption.is_some());
    }
}
