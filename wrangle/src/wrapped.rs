//! Wrapped handlers: what the host actually invokes.

use crate::dispatch::Dispatcher;
use std::{fmt, sync::Arc};
use wrangle_core::{
    AsyncFn, Cleanup, LongRunningFn, NativeHandle, Output, Payload, RawHandler, Strategy, SyncFn,
};
use wrangle_std::invoke::{cooperative, sync, task};

/// The result of [`Dispatcher::wrap`].
pub enum Wrapped<R, E, T = ()> {
    /// A handler invoked through Wrangle's uniform signature.
    Handler(WrappedHandler<R, E, T>),
    /// A native callback, returned as-is for the host to invoke itself.
    Native(NativeHandle),
}

impl<R, E, T> Wrapped<R, E, T> {
    /// The wrapped handler, unless this is a native callback.
    pub fn handler(&self) -> Option<&WrappedHandler<R, E, T>> {
        match self {
            Wrapped::Handler(handler) => Some(handler),
            Wrapped::Native(_) => None,
        }
    }

    /// Take the wrapped handler, unless this is a native callback.
    pub fn into_handler(self) -> Option<WrappedHandler<R, E, T>> {
        match self {
            Wrapped::Handler(handler) => Some(handler),
            Wrapped::Native(_) => None,
        }
    }

    /// The native callback, if that is what was wrapped.
    pub fn native(&self) -> Option<&NativeHandle> {
        match self {
            Wrapped::Handler(_) => None,
            Wrapped::Native(native) => Some(native),
        }
    }

    /// The raw handler that was wrapped.
    pub fn raw(&self) -> RawHandler<R, E, T> {
        match self {
            Wrapped::Handler(handler) => handler.raw.clone(),
            Wrapped::Native(native) => RawHandler::Native(native.clone()),
        }
    }

    /// The strategy the raw handler classified into.
    pub fn strategy(&self) -> Strategy {
        match self {
            Wrapped::Handler(handler) => handler.strategy(),
            Wrapped::Native(_) => Strategy::Native,
        }
    }
}

impl<R, E, T> fmt::Debug for Wrapped<R, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wrapped::Handler(handler) => f.debug_tuple("Handler").field(handler).finish(),
            Wrapped::Native(native) => f.debug_tuple("Native").field(native).finish(),
        }
    }
}

/// The strategy bound at wrap time.
pub(crate) enum Invoker<R, E, T> {
    Noop,
    Sync(SyncFn<R, E, T>),
    Cooperative(LongRunningFn<R, E, T>),
    Async(AsyncFn<R, E, T>),
}

impl<R, E, T> Clone for Invoker<R, E, T> {
    fn clone(&self) -> Self {
        match self {
            Invoker::Noop => Invoker::Noop,
            Invoker::Sync(f) => Invoker::Sync(f.clone()),
            Invoker::Cooperative(f) => Invoker::Cooperative(f.clone()),
            Invoker::Async(f) => Invoker::Async(f.clone()),
        }
    }
}

/// A handler bound to its receiver, cleanup and invocation strategy.
///
/// [`call`](Self::call) never fails and never waits on anything but a
/// synchronous handler's own body. Failures are reported through the
/// dispatcher's reporter; values only surface through the cleanup.
pub struct WrappedHandler<R, E, T = ()> {
    pub(crate) receiver: Arc<R>,
    pub(crate) raw: RawHandler<R, E, T>,
    pub(crate) cleanup: Option<Cleanup<R, T>>,
    pub(crate) invoker: Invoker<R, E, T>,
    pub(crate) dispatcher: Dispatcher,
}

impl<R, E, T> WrappedHandler<R, E, T>
where
    R: Send + Sync + 'static,
    E: Payload,
    T: Output,
{
    /// Invoke the handler with the host's arguments.
    pub fn call(&self, args: E) {
        let dispatcher = &self.dispatcher;
        match &self.invoker {
            Invoker::Noop => {}
            Invoker::Sync(handler) => sync::invoke(
                &self.receiver,
                handler,
                self.cleanup.as_ref(),
                &*dispatcher.reporter,
                args,
            ),
            Invoker::Cooperative(handler) => cooperative::invoke(
                &self.receiver,
                handler,
                self.cleanup.as_ref(),
                &dispatcher.scheduler,
                &dispatcher.reporter,
                args,
            ),
            Invoker::Async(handler) => {
                task::launch(
                    &self.receiver,
                    handler,
                    self.cleanup.as_ref(),
                    &*dispatcher.runner,
                    &dispatcher.reporter,
                    args,
                );
            }
        }
    }
}

impl<R, E, T> WrappedHandler<R, E, T> {
    /// The receiver the handler is bound to.
    pub fn receiver(&self) -> &Arc<R> {
        &self.receiver
    }

    /// The raw handler, for identity checks against the original registration.
    pub fn raw(&self) -> &RawHandler<R, E, T> {
        &self.raw
    }

    /// The cleanup, if one was given.
    pub fn cleanup(&self) -> Option<&Cleanup<R, T>> {
        self.cleanup.as_ref()
    }

    /// The strategy the raw handler classified into.
    pub fn strategy(&self) -> Strategy {
        self.raw.strategy()
    }
}

impl<R, E, T> Clone for WrappedHandler<R, E, T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            raw: self.raw.clone(),
            cleanup: self.cleanup.clone(),
            invoker: self.invoker.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<R, E, T> fmt::Debug for WrappedHandler<R, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedHandler")
            .field("raw", &self.raw)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}
