//! Error types for Wrangle.
//!
//! This module provides the error vocabulary of the dispatch boundary using
//! `thiserror`:
//!
//! - [`BoxError`] - What handler bodies and cleanups return on failure
//! - [`CallError`] - A caught failure, either an `Err` or a panic
//! - [`FaultKind`] - Which strategy and phase a failure came from
//! - [`HandlerFault`] - A failure tagged with its kind, as handed to a
//!   [`Reporter`](crate::Reporter)

use std::{any::Any, error::Error as StdError, fmt};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure caught at the dispatch boundary.
#[derive(Error, Debug)]
pub enum CallError {
    /// The handler or cleanup returned an error.
    #[error("{0}")]
    Failed(BoxError),

    /// The handler or cleanup panicked.
    ///
    /// Only the panic message survives unwinding, so the rendered stack has
    /// a single frame and no source location. The location is printed by the
    /// process's panic hook (the default hook writes a `thread '..' panicked
    /// at <file>:<line>` line to stderr) before the fault is reported.
    #[error("panicked: {0}")]
    Panic(String),
}

impl CallError {
    /// Build a [`CallError::Panic`] from a payload caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallError::Panic(message)
    }

    /// The wrapped error, if the failure was not a panic.
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            CallError::Failed(err) => Some(err.as_ref()),
            CallError::Panic(_) => None,
        }
    }
}

impl From<BoxError> for CallError {
    fn from(err: BoxError) -> Self {
        CallError::Failed(err)
    }
}

/// The strategy and phase a caught failure originated from.
///
/// Each kind renders with its own message prefix; log scrapers rely on these
/// prefixes being stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A synchronous handler body failed.
    HandlerError,
    /// The cleanup of a synchronous handler failed.
    HandlerCleanupError,
    /// A step of a long-running handler failed.
    LongRunningHandlerError,
    /// The cleanup after a long-running handler completed failed.
    LongRunningHandlerCleanupError,
    /// An asynchronous handler body failed.
    AsyncHandlerError,
    /// The cleanup after an asynchronous handler completed failed.
    AsyncHandlerCleanupError,
}

impl FaultKind {
    /// The verbatim message prefix of this kind.
    pub const fn prefix(self) -> &'static str {
        match self {
            FaultKind::HandlerError => "Error in handler",
            FaultKind::HandlerCleanupError => "Error in handler cleanup",
            FaultKind::LongRunningHandlerError => "Error in long running handler",
            FaultKind::LongRunningHandlerCleanupError => "Error in long running handler cleanup",
            FaultKind::AsyncHandlerError => "Error in async handler",
            FaultKind::AsyncHandlerCleanupError => "Error in async handler cleanup",
        }
    }

    /// Whether the failure happened in a cleanup rather than a handler body.
    pub const fn is_cleanup(self) -> bool {
        matches!(
            self,
            FaultKind::HandlerCleanupError
                | FaultKind::LongRunningHandlerCleanupError
                | FaultKind::AsyncHandlerCleanupError
        )
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failure caught at the dispatch boundary, tagged with where it came from.
#[derive(Error, Debug)]
#[error("{prefix}: {error}", prefix = .kind.prefix())]
pub struct HandlerFault {
    kind: FaultKind,
    #[source]
    error: CallError,
}

impl HandlerFault {
    /// Create a new fault.
    pub fn new(kind: FaultKind, error: impl Into<CallError>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// The kind of this fault.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The caught failure.
    pub fn error(&self) -> &CallError {
        &self.error
    }

    /// Render the full report: the prefixed message line, then the stack of
    /// the failure and every error in its `source()` chain.
    pub fn render(&self) -> String {
        let mut out = format!("{self}\nStack (most recent cause last):\n");
        out.push_str(&format!("  0: {}\n", self.error));
        let mut depth = 1;
        let mut source = self.error.inner().and_then(|err| err.source());
        while let Some(err) = source {
            out.push_str(&format!("  {depth}: {err}\n"));
            depth += 1;
            source = err.source();
        }
        out
    }
}
