//! Test result models
//!
//! Defines test outcomes, per-test results and suite summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ExecutionMode;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
    /// Never ran to completion because the drain was interrupted
    Abandoned,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::Error => "!",
            TestStatus::Abandoned => "-",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }

    /// Whether this status should fail the run
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            TestStatus::Fail | TestStatus::Error | TestStatus::Abandoned
        )
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
            TestStatus::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// Result of a single test method
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Position of the method in discovery order
    pub index: usize,
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl TestResult {
    pub fn new(index: usize, name: impl Into<String>, status: TestStatus, duration_ms: u64) -> Self {
        Self {
            index,
            name: name.into(),
            status,
            duration_ms,
            message: None,
        }
    }

    pub fn pass(index: usize, name: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(index, name, TestStatus::Pass, duration_ms)
    }

    pub fn fail(
        index: usize,
        name: impl Into<String>,
        duration_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::new(index, name, TestStatus::Fail, duration_ms).with_message(message)
    }

    pub fn skip(index: usize, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(index, name, TestStatus::Skip, 0).with_message(reason)
    }

    pub fn error(
        index: usize,
        name: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self::new(index, name, TestStatus::Error, duration_ms).with_message(error)
    }

    pub fn abandoned(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, name, TestStatus::Abandoned, 0)
            .with_message("drain interrupted before the test finished")
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.name,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one suite run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub round: u32,
    pub suite: String,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub abandoned: usize,
    /// Sum of per-test durations
    pub total_duration_ms: u64,
    /// Time from first enqueue to the end of the drain
    pub wall_clock_ms: u64,
    /// Why the drain stopped early, if it did
    pub interruption: Option<String>,
    pub results: Vec<TestResult>,
}

impl SuiteSummary {
    pub fn new(
        round: u32,
        suite: impl Into<String>,
        mode: ExecutionMode,
        mut results: Vec<TestResult>,
    ) -> Self {
        results.sort_by_key(|r| r.index);

        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        let total = results.len();
        let passed = count(TestStatus::Pass);
        let failed = count(TestStatus::Fail);
        let skipped = count(TestStatus::Skip);
        let errors = count(TestStatus::Error);
        let abandoned = count(TestStatus::Abandoned);
        let total_duration_ms = results.iter().map(|r| r.duration_ms).sum();

        Self {
            round,
            suite: suite.into(),
            mode,
            started_at: Utc::now(),
            total,
            passed,
            failed,
            skipped,
            errors,
            abandoned,
            total_duration_ms,
            wall_clock_ms: 0,
            interruption: None,
            results,
        }
    }

    pub fn with_wall_clock(mut self, started_at: DateTime<Utc>, wall_clock_ms: u64) -> Self {
        self.started_at = started_at;
        self.wall_clock_ms = wall_clock_ms;
        self
    }

    pub fn with_interruption(mut self, reason: impl Into<String>) -> Self {
        self.interruption = Some(reason.into());
        self
    }

    pub fn pass_rate(&self) -> f64 {
        let ran = self.total - self.skipped;
        if ran == 0 {
            0.0
        } else {
            (self.passed as f64 / ran as f64) * 100.0
        }
    }

    /// No failures, errors, abandoned tests or interruption
    pub fn is_success(&self) -> bool {
        self.interruption.is_none() && !self.results.iter().any(|r| r.status.is_problem())
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Round {} - {} ({})", self.round, self.suite, self.mode)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Error: {} | Abandoned: {}",
            self.total, self.passed, self.failed, self.skipped, self.errors, self.abandoned
        )?;
        if let Some(reason) = &self.interruption {
            writeln!(f, "Interrupted: {reason}")?;
        }
        writeln!(
            f,
            "Pass Rate: {:.1}% | Wall clock: {}ms",
            self.pass_rate(),
            self.wall_clock_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_creation() {
        let result = TestResult::pass(0, "login", 100);
        assert!(result.status.is_success());
        assert_eq!(result.duration_ms, 100);
        assert_eq!(result.to_string(), "✓ login [100ms]");

        let result = TestResult::abandoned(3, "slow");
        assert!(result.status.is_problem());
        assert!(result.message.is_some());
    }

    #[test]
    fn test_summary_orders_by_discovery_index() {
        let results = vec![
            TestResult::fail(2, "c", 50, "assertion failed"),
            TestResult::pass(0, "a", 100),
            TestResult::skip(1, "b", "skipped by configuration"),
            TestResult::abandoned(3, "d"),
        ];

        let summary = SuiteSummary::new(1, "demo", ExecutionMode::Parallel, results);
        let names: Vec<_> = summary.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.abandoned, 1);
        assert_eq!(summary.total_duration_ms, 150);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_pass_rate_ignores_skips() {
        let results = vec![
            TestResult::pass(0, "a", 1),
            TestResult::skip(1, "b", "skip"),
        ];
        let summary = SuiteSummary::new(1, "demo", ExecutionMode::Serial, results);
        assert_eq!(summary.pass_rate(), 100.0);
        assert!(summary.is_success());

        let interrupted = summary.with_interruption("drain cancelled");
        assert!(!interrupted.is_success());
    }

    #[test]
    fn test_empty_summary() {
        let summary = SuiteSummary::new(1, "empty", ExecutionMode::Serial, Vec::new());
        assert_eq!(summary.pass_rate(), 0.0);
        assert!(summary.is_success());
    }
}
