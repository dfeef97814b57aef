//! # Host Interfaces
//!
//! The narrow surface through which Wrangle talks to the host event loop.
//! Wrangle never runs a loop itself; it only asks the host to run work later.
//!
//! - [`Scheduler`] - "call soon" and "call after delay" primitives, used to
//!   step long-running handlers
//! - [`TaskRunner`] - spawns asynchronous handler bodies as independent tasks
//!
//! Both are expected to be non-blocking: a call only enqueues work and returns.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Boxed future used at the task seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of work handed to a [`Scheduler`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The host loop's scheduling primitives.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot schedule host work",
    label = "missing `Scheduler` implementation",
    note = "A scheduler must provide `call_soon` and `call_later` on the host loop."
)]
pub trait Scheduler: Send + Sync + 'static {
    /// Run `job` at the host's next idle opportunity.
    ///
    /// Must never run `job` synchronously inside this call.
    fn call_soon(&self, job: Job);

    /// Run `job` once `delay` has elapsed.
    fn call_later(&self, delay: Duration, job: Job);
}

/// The host's task-spawning primitive.
pub trait TaskRunner: Send + Sync + 'static {
    /// Begin running `task` concurrently with the caller.
    fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn call_soon(&self, job: Job) {
        (**self).call_soon(job)
    }

    fn call_later(&self, delay: Duration, job: Job) {
        (**self).call_later(delay, job)
    }
}

impl<T: TaskRunner + ?Sized> TaskRunner for Arc<T> {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle {
        (**self).spawn(task)
    }
}

/// Observation handle for a spawned task.
///
/// Dropping the handle does not cancel the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    finished: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Wrap `task` so that the returned handle observes its completion.
    ///
    /// Runners call this and spawn the returned future in place of `task`.
    pub fn track(task: BoxFuture<'static, ()>) -> (TaskHandle, BoxFuture<'static, ()>) {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let tracked = Box::pin(async move {
            task.await;
            flag.store(true, Ordering::Release);
        });
        (TaskHandle { finished }, tracked)
    }

    /// Whether the task has run to completion.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
