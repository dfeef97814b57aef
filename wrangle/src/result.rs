//! # Async Results
//!
//! An [`AsyncResult`] stands for the eventual outcome of an asynchronous
//! operation (a dialog closing, an image loading). It moves from pending to
//! resolved or rejected exactly once, and is read by awaiting it or by
//! registering an observer with [`AsyncResult::on_result`].
//!
//! A pending result is not its value. It deliberately has no `PartialEq` or
//! `PartialOrd`, so comparing one against a value does not compile:
//!
//! ```compile_fail
//! use wrangle::{AsyncResult, ResultKind};
//!
//! struct Test;
//! impl ResultKind for Test {
//!     const NAME: &'static str = "Test";
//!     type Output = u32;
//! }
//!
//! let (result, _resolver) = AsyncResult::<Test>::new();
//! let _ = result == 42;
//! ```
//!
//! Code that must expose a comparison entry point anyway goes through
//! [`AsyncResult::compare`], which always fails with a [`ComparisonError`].

use futures::{
    FutureExt,
    channel::oneshot,
    future::{BoxFuture, Shared},
};
use std::{
    error::Error as StdError,
    fmt,
    future::IntoFuture,
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use wrangle_core::BoxError;

/// Declares what an [`AsyncResult`] eventually holds.
///
/// # Example
///
/// ```rust,ignore
/// struct Dialog;
///
/// impl ResultKind for Dialog {
///     const NAME: &'static str = "Dialog";
///     type Output = bool;
/// }
/// ```
pub trait ResultKind: 'static {
    /// The name used in messages and debug output.
    const NAME: &'static str;

    /// The value a resolved result holds.
    type Output: Clone + Send + Sync + 'static;
}

/// Why an [`AsyncResult`] did not resolve to a value.
#[derive(Error, Debug, Clone)]
pub enum AsyncResultError {
    /// The producer rejected the result.
    #[error("{0}")]
    Rejected(Arc<dyn StdError + Send + Sync + 'static>),

    /// The producer went away without settling the result.
    #[error("result abandoned before it was settled")]
    Abandoned,
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Returned when an [`AsyncResult`] is compared directly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Can't check {kind} result directly; use await or an on_result handler")]
pub struct ComparisonError {
    kind: &'static str,
    op: Comparison,
}

impl ComparisonError {
    /// The result kind that was compared.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The attempted operator.
    pub fn op(&self) -> Comparison {
        self.op
    }
}

/// Where an [`AsyncResult`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultState {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Rejected,
}

type Outcome<T> = Result<T, AsyncResultError>;
type Observer<T> = Box<dyn FnOnce(Result<&T, &AsyncResultError>) + Send>;
type Observers<T> = Arc<Mutex<Vec<Observer<T>>>>;

/// The future behind an [`AsyncResult`]; awaiting a result awaits this.
pub type Settled<T> = Shared<BoxFuture<'static, Result<T, AsyncResultError>>>;

fn lock<T>(observers: &Mutex<Vec<Observer<T>>>) -> MutexGuard<'_, Vec<Observer<T>>> {
    // Observers run outside the lock, so poisoning leaves the list consistent.
    observers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The eventual outcome of an asynchronous operation of kind `K`.
///
/// Clones observe the same outcome. Awaiting goes through [`IntoFuture`],
/// so a result can be awaited by value any number of times via clones.
pub struct AsyncResult<K: ResultKind> {
    settled: Settled<K::Output>,
    observers: Observers<K::Output>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResultKind> AsyncResult<K> {
    /// Create a pending result and the resolver that settles it.
    pub fn new() -> (Self, Resolver<K>) {
        let (sender, receiver) = oneshot::channel::<Outcome<K::Output>>();
        let settled = receiver
            .map(|received| received.unwrap_or(Err(AsyncResultError::Abandoned)))
            .boxed()
            .shared();
        let observers: Observers<K::Output> = Arc::default();
        let result = Self {
            settled,
            observers: observers.clone(),
            _kind: PhantomData,
        };
        let resolver = Resolver {
            sender: Some(sender),
            observers,
            _kind: PhantomData,
        };
        (result, resolver)
    }

    /// The declared kind name.
    pub fn kind(&self) -> &'static str {
        K::NAME
    }

    /// The current state.
    pub fn state(&self) -> ResultState {
        match self.outcome() {
            None => ResultState::Pending,
            Some(Ok(_)) => ResultState::Resolved,
            Some(Err(_)) => ResultState::Rejected,
        }
    }

    /// Whether the result is still pending.
    pub fn is_pending(&self) -> bool {
        self.state() == ResultState::Pending
    }

    /// Call `observer` once, when the result settles.
    ///
    /// If it has already settled, `observer` runs immediately.
    pub fn on_result<F>(&self, observer: F)
    where
        F: FnOnce(Result<&K::Output, &AsyncResultError>) + Send + 'static,
    {
        let settled = {
            let mut observers = lock(&self.observers);
            match self.outcome() {
                Some(outcome) => outcome,
                None => {
                    observers.push(Box::new(observer));
                    return;
                }
            }
        };
        observer(settled.as_ref());
    }

    /// Comparison entry point. Always fails: a result must be awaited or
    /// observed, not compared.
    pub fn compare<V: ?Sized>(&self, op: Comparison, _other: &V) -> Result<bool, ComparisonError> {
        Err(ComparisonError { kind: K::NAME, op })
    }

    /// The outcome, if settled. A value sent but not yet polled through is
    /// picked up with a single non-blocking poll.
    fn outcome(&self) -> Option<Outcome<K::Output>> {
        match self.settled.peek() {
            Some(outcome) => Some(outcome.clone()),
            None => self.settled.clone().now_or_never(),
        }
    }
}

impl<K: ResultKind> Clone for AsyncResult<K> {
    fn clone(&self) -> Self {
        Self {
            settled: self.settled.clone(),
            observers: self.observers.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ResultKind> IntoFuture for AsyncResult<K> {
    type Output = Outcome<K::Output>;
    type IntoFuture = Settled<K::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.settled
    }
}

impl<K: ResultKind> fmt::Debug for AsyncResult<K>
where
    K::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Async {} result; future=", K::NAME)?;
        match self.outcome() {
            None => f.write_str("<Future pending>")?,
            Some(Ok(value)) => write!(f, "<Future finished result={value:?}>")?,
            Some(Err(err)) => write!(f, "<Future finished exception={err}>")?,
        }
        f.write_str(">")
    }
}

/// The producer side of an [`AsyncResult`].
///
/// Settling consumes the resolver, so a result settles at most once.
/// Dropping it unsettled rejects the result with
/// [`AsyncResultError::Abandoned`].
pub struct Resolver<K: ResultKind> {
    sender: Option<oneshot::Sender<Outcome<K::Output>>>,
    observers: Observers<K::Output>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResultKind> Resolver<K> {
    /// Resolve the result with `value`.
    pub fn resolve(mut self, value: K::Output) {
        self.settle(Some(Ok(value)));
    }

    /// Reject the result with `err`.
    pub fn reject(mut self, err: impl Into<BoxError>) {
        let err: BoxError = err.into();
        self.settle(Some(Err(AsyncResultError::Rejected(Arc::from(err)))));
    }

    /// Send `outcome`, or cancel the channel when there is none, then run the
    /// observers registered so far.
    fn settle(&mut self, outcome: Option<Outcome<K::Output>>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let outcome = match outcome {
            Some(outcome) => {
                // Every AsyncResult may be gone already; observers still run.
                let _ = sender.send(outcome.clone());
                outcome
            }
            None => {
                drop(sender);
                Err(AsyncResultError::Abandoned)
            }
        };
        let observers = std::mem::take(&mut *lock(&self.observers));
        for observer in observers {
            observer(outcome.as_ref());
        }
    }
}

impl<K: ResultKind> Drop for Resolver<K> {
    fn drop(&mut self) {
        self.settle(None);
    }
}

impl<K: ResultKind> fmt::Debug for Resolver<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("kind", &K::NAME)
            .field("settled", &self.sender.is_none())
            .finish()
    }
}
