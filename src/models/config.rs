//! Scheduler configuration models
//!
//! Suite-level execution preferences, resolved once before a run starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a suite's tests are dispatched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Serial,
    Parallel,
}

impl ExecutionMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "serial" | "sequential" => Some(ExecutionMode::Serial),
            "parallel" | "concurrent" => Some(ExecutionMode::Parallel),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionMode::Serial => "serial",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Longest accepted drain timeout (one week)
pub const MAX_DRAIN_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Scheduler configuration for one suite run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Serial or parallel dispatch
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Worker count for parallel mode; absent or non-positive is unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<i64>,

    /// Upper bound on the completion wait, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_timeout_secs: Option<u64>,
}

impl SchedulerConfig {
    pub fn serial() -> Self {
        Self::default()
    }

    /// Parallel mode with an unbounded pool
    pub fn parallel() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, count: i64) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn with_drain_timeout(mut self, secs: u64) -> Self {
        self.drain_timeout_secs = Some(secs);
        self
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_parallel(&self) -> bool {
        self.mode == ExecutionMode::Parallel
    }
}

impl fmt::Display for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mode, self.worker_count) {
            (ExecutionMode::Serial, _) => write!(f, "serial"),
            (ExecutionMode::Parallel, Some(n)) if n > 0 => write!(f, "parallel ({n} workers)"),
            (ExecutionMode::Parallel, _) => write!(f, "parallel (unbounded)"),
        }
    }
}
