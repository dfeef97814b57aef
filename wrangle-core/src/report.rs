//! The logging sink for caught handler failures.

use crate::error::HandlerFault;
use std::sync::Arc;

/// Receives every failure caught at the dispatch boundary.
///
/// Implementations must keep the fault's message prefix intact and should
/// include [`HandlerFault::render`] so the failure's full chain is recorded.
pub trait Reporter: Send + Sync + 'static {
    /// Record one caught failure.
    fn report(&self, fault: &HandlerFault);
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report(&self, fault: &HandlerFault) {
        (**self).report(fault)
    }
}
