//! Work units and their outcome channels

use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;

/// One test invocation, opaque to the scheduler.
///
/// Fixture setup and teardown are expected to be folded into the future by
/// whoever builds the unit.
pub struct WorkUnit {
    name: String,
    task: BoxFuture<'static, ()>,
}

impl WorkUnit {
    /// Wrap a future that reports nothing back.
    ///
    /// A panic inside `task` is not caught: on the serial executor it
    /// propagates to the caller of `enqueue`.
    pub fn new<F>(name: impl Into<String>, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            task: task.boxed(),
        }
    }

    /// Wrap a future and pair it with a channel carrying its outcome.
    ///
    /// Panics are caught and delivered as [`UnitOutcome::Panicked`]. If the
    /// unit is dropped before finishing, the handle resolves to
    /// [`UnitOutcome::Abandoned`].
    pub fn reporting<F, T>(name: impl Into<String>, task: F) -> (Self, OutcomeHandle<T>)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = oneshot::channel();

        let unit = Self::new(name.clone(), async move {
            let outcome = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .map_err(panic_message);
            // The driver may have stopped listening; that is its call.
            let _ = tx.send(outcome);
        });

        (unit, OutcomeHandle { name, rx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, BoxFuture<'static, ()>) {
        (self.name, self.task)
    }
}

impl fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkUnit").field("name", &self.name).finish()
    }
}

/// What happened to a reporting unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitOutcome<T> {
    /// The body ran to completion and produced a value
    Finished(T),
    /// The body panicked
    Panicked(String),
    /// The unit was dropped before it finished
    Abandoned,
}

/// Receiving end of a reporting unit's outcome channel
#[derive(Debug)]
pub struct OutcomeHandle<T> {
    name: String,
    rx: oneshot::Receiver<Result<T, String>>,
}

impl<T> OutcomeHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the unit's outcome
    pub async fn outcome(self) -> UnitOutcome<T> {
        match self.rx.await {
            Ok(Ok(value)) => UnitOutcome::Finished(value),
            Ok(Err(message)) => UnitOutcome::Panicked(message),
            Err(_) => UnitOutcome::Abandoned,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
