//! Scheduler selection from suite configuration

use tracing::debug;

use super::{ConcurrentExecutor, PoolSize, Scheduler, SchedulerError, SerialExecutor};
use crate::models::{ExecutionMode, SchedulerConfig};

/// Build the scheduler a suite asked for.
///
/// No configuration means serial execution. Parallel mode with an absent or
/// non-positive worker count gets an unbounded pool; a positive count gets a
/// fixed pool of exactly that many workers. Pool construction failures are
/// reported here rather than on first enqueue.
pub fn select(config: Option<&SchedulerConfig>) -> Result<Box<dyn Scheduler>, SchedulerError> {
    let Some(config) = config else {
        debug!("No scheduler configuration; using serial executor");
        return Ok(Box::new(SerialExecutor::new()));
    };

    match config.mode {
        ExecutionMode::Serial => Ok(Box::new(SerialExecutor::new())),
        ExecutionMode::Parallel => {
            let pool = PoolSize::from_worker_count(config.worker_count);
            let mut executor = ConcurrentExecutor::new(pool)?;
            if let Some(timeout) = config.drain_timeout() {
                executor = executor.with_drain_timeout(timeout);
            }
            debug!("Selected concurrent executor ({})", pool);
            Ok(Box::new(executor))
        }
    }
}
