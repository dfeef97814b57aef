//! Tokio host - runs scheduled jobs and handler tasks on a tokio runtime.
//!
//! **Note**: handler dispatch assumes a single host thread. Use a
//! `current_thread` runtime so scheduled steps never run in parallel with
//! each other.

use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use wrangle_core::{BoxFuture, Job, Scheduler, TaskHandle, TaskRunner};

/// A [`Scheduler`] and [`TaskRunner`] backed by a tokio runtime handle.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let host = TokioHost::current();
///     host.call_later(Duration::from_millis(10), Box::new(|| println!("later")));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TokioHost {
    handle: Handle,
}

impl TokioHost {
    /// Create a host on the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a host on the runtime of the current context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Create a host on the runtime of the current context, if there is one.
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// The underlying runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Scheduler for TokioHost {
    fn call_soon(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }

    fn call_later(&self, delay: Duration, job: Job) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
    }
}

impl TaskRunner for TokioHost {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle {
        let (handle, task) = TaskHandle::track(task);
        self.handle.spawn(task);
        handle
    }
}
