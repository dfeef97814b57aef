//! Synchronous invoker.

use super::{guard, run_cleanup};
use std::sync::Arc;
use wrangle_core::{Cleanup, FaultKind, HandlerFault, Reporter, SyncFn};

/// Run a synchronous handler immediately, then its cleanup.
///
/// A failing handler is reported as [`FaultKind::HandlerError`] and skips
/// cleanup; a failing cleanup is reported as
/// [`FaultKind::HandlerCleanupError`]. Either way this returns normally.
pub fn invoke<R, E, T>(
    receiver: &Arc<R>,
    handler: &SyncFn<R, E, T>,
    cleanup: Option<&Cleanup<R, T>>,
    reporter: &dyn Reporter,
    args: E,
) {
    match guard(|| handler(receiver, args)) {
        Ok(value) => run_cleanup(
            FaultKind::HandlerCleanupError,
            receiver,
            cleanup,
            value,
            reporter,
        ),
        Err(err) => reporter.report(&HandlerFault::new(FaultKind::HandlerError, err)),
    }
}
