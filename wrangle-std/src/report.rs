//! Standard reporters: where caught handler failures get logged.

use std::{io::Write, sync::Arc};
use wrangle_core::{HandlerFault, Reporter};

/// A reporter that emits each fault as a `tracing` error event.
///
/// The event carries the fault kind as a structured `kind` field, whether it
/// came from a cleanup as `cleanup`, and the full rendered report as its
/// message.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

#[cfg(feature = "tracing")]
impl Reporter for TracingReporter {
    fn report(&self, fault: &HandlerFault) {
        tracing::error!(
            kind = %fault.kind(),
            cleanup = fault.kind().is_cleanup(),
            "{}",
            fault.render()
        );
    }
}

/// A reporter that writes each rendered fault to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&self, fault: &HandlerFault) {
        // Nothing sensible left to do if stderr itself is gone.
        let _ = std::io::stderr().lock().write_all(fault.render().as_bytes());
    }
}

/// The reporter used when none is configured: [`TracingReporter`] when the
/// `tracing` feature is enabled, otherwise [`StderrReporter`].
pub fn default_reporter() -> Arc<dyn Reporter> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingReporter)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(StderrReporter)
    }
}
