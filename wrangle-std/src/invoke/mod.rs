//! Invocation strategies.
//!
//! One invoker per executable handler shape. Each is a single error boundary:
//! whatever the body or its cleanup does, the failure ends up as one
//! [`HandlerFault`] handed to the [`Reporter`] and never reaches the caller.
//!
//! - [`sync`] - run immediately on the caller's thread
//! - [`cooperative`] - step a [`LongRunning`](wrangle_core::LongRunning) body
//!   across host turns
//! - [`task`] - spawn an async body on the host's task runner

pub mod cooperative;
pub mod sync;
pub mod task;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use wrangle_core::{BoxError, CallError, Cleanup, FaultKind, HandlerFault, Reporter};

/// Run `f`, turning both an `Err` and a panic into a [`CallError`].
///
/// No panic hook is installed here: whatever hook the process has still
/// runs first, so a panic is seen once by the hook and once as a fault.
pub(crate) fn guard<T>(f: impl FnOnce() -> Result<T, BoxError>) -> Result<T, CallError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CallError::Failed(err)),
        Err(payload) => Err(CallError::from_panic(payload)),
    }
}

/// Run the cleanup (if any) on a successful value, reporting its failure as `kind`.
pub(crate) fn run_cleanup<R, T>(
    kind: FaultKind,
    receiver: &Arc<R>,
    cleanup: Option<&Cleanup<R, T>>,
    value: T,
    reporter: &dyn Reporter,
) {
    let Some(cleanup) = cleanup else {
        return;
    };
    if let Err(err) = guard(|| cleanup.call(receiver, value)) {
        reporter.report(&HandlerFault::new(kind, err));
    }
}
