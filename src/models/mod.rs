//! Data models for suite scheduling
//!
//! Scheduler configuration and test outcome types shared across the crate.

mod config;
mod test_result;

pub use config::{ExecutionMode, SchedulerConfig, MAX_DRAIN_TIMEOUT_SECS};
pub use test_result::{SuiteSummary, TestResult, TestStatus};
