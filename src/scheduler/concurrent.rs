//! Concurrent test execution
//!
//! Dispatches units onto a worker pool owned by the executor. A fixed pool
//! admits at most `k` units at a time through a fair semaphore, so units
//! start in submission order as workers free up. An unbounded pool starts
//! every unit as soon as it is submitted and lets the runtime reuse idle
//! worker threads.

use async_trait::async_trait;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{DrainReport, Lifecycle, Scheduler, SchedulerError, SchedulerKind, WorkUnit};

/// Worker pool sizing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolSize {
    /// Exactly this many units may run at once
    Fixed(NonZeroUsize),
    /// No cap on simultaneously running units
    Unbounded,
}

impl PoolSize {
    /// Resolve a configured worker count; absent or non-positive is unbounded
    pub fn from_worker_count(count: Option<i64>) -> Self {
        count
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .and_then(NonZeroUsize::new)
            .map(PoolSize::Fixed)
            .unwrap_or(PoolSize::Unbounded)
    }

    /// Concurrency cap, if any
    pub fn limit(&self) -> Option<usize> {
        match self {
            PoolSize::Fixed(n) => Some(n.get()),
            PoolSize::Unbounded => None,
        }
    }
}

impl fmt::Display for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolSize::Fixed(n) => write!(f, "{n} workers"),
            PoolSize::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// How a pooled unit left the pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnitExit {
    Completed,
    /// The pool closed before the unit was admitted
    Abandoned,
}

/// Why a drain stopped before the pool emptied
enum Interrupt {
    Cancelled,
    TimedOut(Duration),
}

/// Scheduler backed by a worker pool
pub struct ConcurrentExecutor {
    pool: PoolSize,
    admission: Option<Arc<Semaphore>>,
    workers: JoinSet<UnitExit>,
    runtime: Handle,
    lifecycle: Lifecycle,
    enqueued: usize,
    drain_timeout: Option<Duration>,
}

impl ConcurrentExecutor {
    /// Create an executor on the current tokio runtime.
    ///
    /// Fails when called outside a runtime or when the fixed pool exceeds
    /// the admission semaphore's permit limit.
    pub fn new(pool: PoolSize) -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current()
            .map_err(|e| SchedulerError::PoolCreation(e.to_string()))?;
        Self::with_runtime(pool, runtime)
    }

    /// Create an executor whose units run on `runtime`
    pub fn with_runtime(pool: PoolSize, runtime: Handle) -> Result<Self, SchedulerError> {
        let admission = match pool {
            PoolSize::Fixed(n) if n.get() > Semaphore::MAX_PERMITS => {
                return Err(SchedulerError::PoolCreation(format!(
                    "{} workers requested, at most {} supported",
                    n,
                    Semaphore::MAX_PERMITS
                )));
            }
            PoolSize::Fixed(n) => Some(Arc::new(Semaphore::new(n.get()))),
            PoolSize::Unbounded => None,
        };

        debug!("Created concurrent executor ({})", pool);

        Ok(Self {
            pool,
            admission,
            workers: JoinSet::new(),
            runtime,
            lifecycle: Lifecycle::Created,
            enqueued: 0,
            drain_timeout: None,
        })
    }

    /// Bound the completion wait; the default waits for every unit
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    pub fn pool(&self) -> PoolSize {
        self.pool
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout
    }

    /// Units submitted and not yet reaped by a drain
    pub fn outstanding(&self) -> usize {
        self.workers.len()
    }

    /// Stop admitting queued units and abort the ones in flight
    fn shut_down(&mut self) {
        if let Some(admission) = &self.admission {
            admission.close();
        }
        self.workers.abort_all();
    }

    /// Reap every remaining unit after `shut_down`
    async fn reap(&mut self, report: &mut DrainReport) {
        while let Some(joined) = self.workers.join_next().await {
            tally(report, joined);
        }
    }
}

fn tally(report: &mut DrainReport, joined: Result<UnitExit, tokio::task::JoinError>) {
    match joined {
        Ok(UnitExit::Completed) => report.completed += 1,
        Ok(UnitExit::Abandoned) => report.abandoned += 1,
        Err(e) if e.is_panic() => {
            warn!("Unit panicked on a pool worker: {}", e);
            report.completed += 1;
        }
        Err(_) => report.abandoned += 1,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl Scheduler for ConcurrentExecutor {
    async fn enqueue(&mut self, unit: WorkUnit) -> Result<(), SchedulerError> {
        if !self.lifecycle.accepts_work() {
            error!(
                "Rejected unit '{}': concurrent executor is {}",
                unit.name(),
                self.lifecycle
            );
            return Err(SchedulerError::NotAccepting(self.lifecycle));
        }
        self.lifecycle = Lifecycle::Accepting;
        self.enqueued += 1;

        let (name, task) = unit.into_parts();
        let admission = self.admission.clone();

        debug!("Dispatching '{}' to pool ({})", name, self.pool);

        self.workers.spawn_on(
            async move {
                let _permit = match admission {
                    Some(admission) => match admission.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            debug!("Pool closed before '{}' was admitted", name);
                            return UnitExit::Abandoned;
                        }
                    },
                    None => None,
                };
                task.await;
                UnitExit::Completed
            },
            &self.runtime,
        );

        Ok(())
    }

    async fn await_completion_until(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, SchedulerError> {
        if !self.lifecycle.accepts_work() {
            error!(
                "Drain requested twice: concurrent executor is {}",
                self.lifecycle
            );
            return Err(SchedulerError::NotAccepting(self.lifecycle));
        }
        self.lifecycle = Lifecycle::Draining;

        info!(
            "Draining {} units from pool ({})",
            self.workers.len(),
            self.pool
        );

        let mut report = DrainReport {
            enqueued: self.enqueued,
            ..DrainReport::default()
        };
        let deadline_at = self.drain_timeout.and_then(|t| {
            let at = Instant::now().checked_add(t);
            if at.is_none() {
                warn!("Drain timeout of {:?} is out of range; waiting without a deadline", t);
            }
            at
        });

        let interrupted = loop {
            if self.workers.is_empty() {
                break None;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(Interrupt::Cancelled),
                _ = deadline(deadline_at) => {
                    break self.drain_timeout.map(Interrupt::TimedOut);
                }
                joined = self.workers.join_next() => {
                    if let Some(joined) = joined {
                        tally(&mut report, joined);
                    }
                }
            }
        };

        if interrupted.is_some() {
            self.shut_down();
            self.reap(&mut report).await;
        } else if let Some(admission) = &self.admission {
            admission.close();
        }
        self.lifecycle = Lifecycle::Terminated;

        match interrupted {
            None => {
                info!("Pool drained: {}", report);
                Ok(report)
            }
            Some(Interrupt::Cancelled) => {
                warn!("Drain cancelled: {}", report);
                Err(SchedulerError::Cancelled(report))
            }
            Some(Interrupt::TimedOut(timeout)) => {
                warn!("Drain timed out after {}ms: {}", timeout.as_millis(), report);
                Err(SchedulerError::TimedOut { timeout, report })
            }
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Concurrent(self.pool)
    }
}

impl Drop for ConcurrentExecutor {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            warn!(
                "Concurrent executor dropped with {} outstanding units; aborting them",
                self.workers.len()
            );
            self.shut_down();
        }
    }
}

impl fmt::Debug for ConcurrentExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentExecutor")
            .field("pool", &self.pool)
            .field("lifecycle", &self.lifecycle)
            .field("enqueued", &self.enqueued)
            .field("outstanding", &self.workers.len())
            .field("drain_timeout", &self.drain_timeout)
            .finish()
    }
}
