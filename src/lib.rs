//! Suite Scheduler - serial and concurrent test-suite execution
//!
//! Decides, per test suite, whether test invocations run one after another
//! or on a worker pool, and manages that pool from first dispatch to drain.
//!
//! ## Overview
//!
//! - [`scheduler`]: the [`Scheduler`] trait, the serial and concurrent
//!   executors, and [`select`] which picks one from a [`SchedulerConfig`]
//! - [`driver`]: test suites with fixtures and the [`SuiteRunner`] that
//!   feeds them to a scheduler and collects outcomes
//! - [`config`]: file and environment configuration
//! - [`output`]: table, JSON, CSV and summary rendering
//!
//! ## Example
//!
//! ```no_run
//! use suite_scheduler::{SchedulerConfig, SuiteRunner, TestSuite};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let suite = TestSuite::new("accounts")
//!     .with_config(SchedulerConfig::parallel().with_workers(4))
//!     .test("create", || async { Ok(()) })
//!     .test("delete", || async { Ok(()) });
//!
//! let summary = SuiteRunner::new(suite).run().await?;
//! assert!(summary.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod models;
pub mod output;
pub mod scheduler;
pub mod utils;

pub use driver::{SuiteRunner, TestSuite};
pub use models::{ExecutionMode, SchedulerConfig, SuiteSummary, TestResult, TestStatus};
pub use scheduler::{select, DrainReport, Scheduler, SchedulerError, WorkUnit};
