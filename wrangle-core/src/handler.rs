//! # Raw Handlers
//!
//! The shapes of callable that application code may register, and the
//! classification that maps each shape onto an invocation strategy.
//!
//! # Handler Shapes
//!
//! 1. **Absent**: nothing registered; invoking is a no-op
//! 2. **Native**: an opaque callback owned by the host toolkit, passed through
//! 3. **Sync**: `|receiver, args| -> Result<T, BoxError>`, run immediately
//! 4. **Long-running**: builds a [`LongRunning`] state machine stepped by the host
//! 5. **Async**: returns a future spawned as an independent task
//!
//! Every shape is a variant of [`RawHandler`]; classification is a `match` on
//! the tag, never runtime probing.

use crate::{error::BoxError, host::BoxFuture, step::LongRunning};
use std::{any::Any, fmt, future::Future, sync::Arc};

/// A synchronous handler body.
pub type SyncFn<R, E, T> = Arc<dyn Fn(&Arc<R>, E) -> Result<T, BoxError> + Send + Sync>;

/// A long-running handler: builds the state machine for one invocation.
///
/// Building must not run the body; the body runs in [`LongRunning::resume`].
pub type LongRunningFn<R, E, T> =
    Arc<dyn Fn(&Arc<R>, E) -> Box<dyn LongRunning<Output = T>> + Send + Sync>;

/// An asynchronous handler body.
pub type AsyncFn<R, E, T> =
    Arc<dyn Fn(Arc<R>, E) -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync>;

/// The invocation strategy a raw handler classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Invoking does nothing.
    None,
    /// The host invokes the native callback itself.
    Native,
    /// Run the body immediately on the caller's thread.
    Sync,
    /// Step the body across host turns.
    Cooperative,
    /// Spawn the body as a task.
    Async,
}

/// An opaque callback meant for the host toolkit.
///
/// Wrangle never calls it; it is handed back to the host untouched. Two
/// handles are equal when they share the same allocation.
#[derive(Clone)]
pub struct NativeHandle(Arc<dyn Any + Send + Sync>);

impl NativeHandle {
    /// Wrap a host-specific callback value.
    pub fn new<N: Any + Send + Sync>(native: N) -> Self {
        Self(Arc::new(native))
    }

    /// Borrow the callback as its concrete host type.
    pub fn downcast_ref<N: Any>(&self) -> Option<&N> {
        self.0.downcast_ref::<N>()
    }
}

impl PartialEq for NativeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NativeHandle {}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// An application-supplied handler, before wrapping.
///
/// `R` is the receiver the handler is registered on, `E` the payload the host
/// passes on each invocation and `T` the value a successful run produces.
///
/// Clones share the underlying callable, and equality is identity: a clone
/// compares equal to its origin, while two separately built handlers never do.
pub enum RawHandler<R, E, T = ()> {
    /// No handler registered.
    Absent,
    /// A callback the host toolkit invokes directly.
    Native(NativeHandle),
    /// A plain synchronous function.
    Sync(SyncFn<R, E, T>),
    /// A multi-step resumable body.
    LongRunning(LongRunningFn<R, E, T>),
    /// An asynchronous function.
    Async(AsyncFn<R, E, T>),
}

impl<R: 'static, E: 'static, T: 'static> RawHandler<R, E, T> {
    /// A synchronous handler.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Arc<R>, E) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        RawHandler::Sync(Arc::new(f))
    }

    /// A long-running handler whose invocations build a [`LongRunning`] body.
    pub fn long_running<F, L>(f: F) -> Self
    where
        F: Fn(&Arc<R>, E) -> L + Send + Sync + 'static,
        L: LongRunning<Output = T>,
    {
        RawHandler::LongRunning(Arc::new(move |receiver: &Arc<R>, args: E| {
            Box::new(f(receiver, args)) as Box<dyn LongRunning<Output = T>>
        }))
    }

    /// An asynchronous handler.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<R>, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        RawHandler::Async(Arc::new(move |receiver: Arc<R>, args: E| {
            Box::pin(f(receiver, args)) as BoxFuture<'static, Result<T, BoxError>>
        }))
    }

    /// A native callback.
    pub fn native<N: Any + Send + Sync>(native: N) -> Self {
        RawHandler::Native(NativeHandle::new(native))
    }
}

impl<R, E, T> RawHandler<R, E, T> {
    /// Classify this handler into the strategy that will invoke it.
    pub fn strategy(&self) -> Strategy {
        match self {
            RawHandler::Absent => Strategy::None,
            RawHandler::Native(_) => Strategy::Native,
            RawHandler::Async(_) => Strategy::Async,
            RawHandler::LongRunning(_) => Strategy::Cooperative,
            RawHandler::Sync(_) => Strategy::Sync,
        }
    }

    /// Whether no handler is registered.
    pub fn is_absent(&self) -> bool {
        matches!(self, RawHandler::Absent)
    }

    fn identity(&self) -> Option<*const ()> {
        match self {
            RawHandler::Absent => None,
            RawHandler::Native(handle) => Some(Arc::as_ptr(&handle.0) as *const ()),
            RawHandler::Sync(f) => Some(Arc::as_ptr(f) as *const ()),
            RawHandler::LongRunning(f) => Some(Arc::as_ptr(f) as *const ()),
            RawHandler::Async(f) => Some(Arc::as_ptr(f) as *const ()),
        }
    }
}

impl<R, E, T> Default for RawHandler<R, E, T> {
    fn default() -> Self {
        RawHandler::Absent
    }
}

impl<R, E, T> Clone for RawHandler<R, E, T> {
    fn clone(&self) -> Self {
        match self {
            RawHandler::Absent => RawHandler::Absent,
            RawHandler::Native(handle) => RawHandler::Native(handle.clone()),
            RawHandler::Sync(f) => RawHandler::Sync(f.clone()),
            RawHandler::LongRunning(f) => RawHandler::LongRunning(f.clone()),
            RawHandler::Async(f) => RawHandler::Async(f.clone()),
        }
    }
}

impl<R, E, T> PartialEq for RawHandler<R, E, T> {
    fn eq(&self, other: &Self) -> bool {
        self.strategy() == other.strategy() && self.identity() == other.identity()
    }
}

impl<R, E, T> Eq for RawHandler<R, E, T> {}

impl<R, E, T> fmt::Debug for RawHandler<R, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawHandler::Absent => f.write_str("Absent"),
            RawHandler::Native(handle) => f.debug_tuple("Native").field(handle).finish(),
            _ => match self.identity() {
                Some(ptr) => write!(f, "{:?}({ptr:p})", self.strategy()),
                None => f.write_str("Absent"),
            },
        }
    }
}

/// A cleanup run after a handler completes successfully, given its value.
pub struct Cleanup<R, T>(Arc<dyn Fn(&Arc<R>, T) -> Result<(), BoxError> + Send + Sync>);

impl<R, T> Cleanup<R, T> {
    /// Wrap a cleanup function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Arc<R>, T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the cleanup.
    pub fn call(&self, receiver: &Arc<R>, value: T) -> Result<(), BoxError> {
        (self.0)(receiver, value)
    }
}

impl<R, T> Clone for Cleanup<R, T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<R, T> fmt::Debug for Cleanup<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cleanup({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}
