//! The dispatcher: host collaborators plus the `wrap` entry point.

use crate::wrapped::{Invoker, Wrapped, WrappedHandler};
use std::{fmt, sync::Arc};
use thiserror::Error;
use wrangle_core::{Cleanup, Output, Payload, RawHandler, Reporter, Scheduler, TaskRunner};
use wrangle_std::report::default_reporter;

/// Errors that can occur while configuring a [`Dispatcher`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// No scheduler was configured.
    #[error("dispatcher needs a scheduler to step long-running handlers")]
    MissingScheduler,

    /// No task runner was configured.
    #[error("dispatcher needs a task runner to spawn async handlers")]
    MissingRunner,
}

/// Wraps raw handlers against one host loop.
///
/// A dispatcher bundles the host's [`Scheduler`], its [`TaskRunner`] and the
/// [`Reporter`] that receives caught failures. Cloning is cheap; every
/// wrapped handler keeps its own clone.
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) runner: Arc<dyn TaskRunner>,
    pub(crate) reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// A dispatcher on `host`, reporting through the default reporter.
    pub fn new<H>(host: H) -> Self
    where
        H: Scheduler + TaskRunner + Clone,
    {
        Self {
            scheduler: Arc::new(host.clone()),
            runner: Arc::new(host),
            reporter: default_reporter(),
        }
    }

    /// A dispatcher on the tokio runtime of the current context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[cfg(feature = "tokio")]
    pub fn tokio() -> Self {
        Self::new(wrangle_std::runtime::tokio::TokioHost::current())
    }

    /// Wrap `raw` so the host can invoke it with a uniform signature.
    ///
    /// The handler is classified once, here. Native callbacks come back
    /// untouched as [`Wrapped::Native`]; every other shape comes back as a
    /// [`WrappedHandler`] whose [`call`](WrappedHandler::call) runs the bound
    /// strategy. `cleanup`, if given, receives the receiver and the value of
    /// every successful run.
    pub fn wrap<R, E, T>(
        &self,
        receiver: Arc<R>,
        raw: RawHandler<R, E, T>,
        cleanup: Option<Cleanup<R, T>>,
    ) -> Wrapped<R, E, T>
    where
        R: Send + Sync + 'static,
        E: Payload,
        T: Output,
    {
        let invoker = match &raw {
            RawHandler::Absent => Invoker::Noop,
            RawHandler::Native(native) => return Wrapped::Native(native.clone()),
            RawHandler::Sync(f) => Invoker::Sync(f.clone()),
            RawHandler::LongRunning(f) => Invoker::Cooperative(f.clone()),
            RawHandler::Async(f) => Invoker::Async(f.clone()),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(strategy = ?raw.strategy(), "wrapped handler");

        Wrapped::Handler(WrappedHandler {
            receiver,
            raw,
            cleanup,
            invoker,
            dispatcher: self.clone(),
        })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    scheduler: Option<Arc<dyn Scheduler>>,
    runner: Option<Arc<dyn TaskRunner>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl DispatcherBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `scheduler` for long-running handlers.
    pub fn scheduler<S: Scheduler>(mut self, scheduler: S) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Use `runner` for async handlers.
    pub fn runner<T: TaskRunner>(mut self, runner: T) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    /// Use `host` as both scheduler and task runner.
    pub fn host<H>(self, host: H) -> Self
    where
        H: Scheduler + TaskRunner + Clone,
    {
        self.scheduler(host.clone()).runner(host)
    }

    /// Send caught failures to `reporter` instead of the default one.
    pub fn reporter<P: Reporter>(mut self, reporter: P) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        Ok(Dispatcher {
            scheduler: self.scheduler.ok_or(BuildError::MissingScheduler)?,
            runner: self.runner.ok_or(BuildError::MissingRunner)?,
            reporter: self.reporter.unwrap_or_else(default_reporter),
        })
    }
}
